//! 墨消し対象の選択集合
//!
//! 現在のレポートの検出数を上限として持ち、範囲外のインデックスは受け付けない。

use crate::error::{Error, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    detection_count: usize,
    members: BTreeSet<usize>,
}

impl SelectionSet {
    /// 検出数 `detection_count` のレポート用に空の集合を作る
    pub fn new(detection_count: usize) -> Self {
        Self {
            detection_count,
            members: BTreeSet::new(),
        }
    }

    pub fn detection_count(&self) -> usize {
        self.detection_count
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.detection_count {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.detection_count,
            })
        }
    }

    /// 追加。新規に追加された場合 true
    pub fn add(&mut self, index: usize) -> Result<bool> {
        self.check(index)?;
        Ok(self.members.insert(index))
    }

    /// 削除。含まれていた場合 true
    pub fn remove(&mut self, index: usize) -> Result<bool> {
        self.check(index)?;
        Ok(self.members.remove(&index))
    }

    /// 反転。操作後に含まれていれば true
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        self.check(index)?;
        if self.members.remove(&index) {
            Ok(false)
        } else {
            self.members.insert(index);
            Ok(true)
        }
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 昇順で列挙
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }

    /// `/api/protect` の indices フィールド値（"0,2" 形式）
    pub fn to_wire(&self) -> String {
        crate::parser::format_indices(self.iter())
    }
}
