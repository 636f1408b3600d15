//! object — object records and the shared reference table.
//!
//! Индекс 0 зарезервирован под INVALID; ссылки назначаются последовательно.
//! Таблица может разделяться между VM- и isolate-снапшотом (один и тот же
//! экземпляр через `Rc<RefCell<..>>`), поэтому ссылки одного видны другому.

use serde::Serialize;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::class_id::ClassId;
use crate::consts::{FIRST_REF, INVALID_REF};

/// Index into the reference table.
pub type RefIndex = usize;

/// Field contents, tagged by what produced the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ObjectData {
    /// Slot 0.
    Invalid,
    /// VM-intrinsic placeholder. `slot` carries the stub cid, stub index or
    /// cache index for the repeated entries.
    Base { name: &'static str, slot: Option<i64> },
    /// Allocated by a cluster, fill has not reached it yet.
    Pending,
    Smi(i64),
    Mint(i64),
    Double(f64),
    String(String),
    Array {
        type_arguments: RefIndex,
        elements: Vec<RefIndex>,
    },
    GrowableArray {
        type_arguments: RefIndex,
        length: RefIndex,
        data: RefIndex,
    },
    TypeArguments {
        hash: i32,
        nullability: u64,
        instantiations: RefIndex,
        types: Vec<RefIndex>,
    },
    /// Object living in the data image at `offset` (relative to its start).
    ReadOnly { offset: usize },
}

/// One entry of the reference table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectRecord {
    pub cid: ClassId,
    pub canonical: bool,
    pub data: ObjectData,
}

impl ObjectRecord {
    pub fn invalid() -> Self {
        Self {
            cid: ClassId::ILLEGAL,
            canonical: false,
            data: ObjectData::Invalid,
        }
    }

    pub fn base(cid: ClassId, name: &'static str) -> Self {
        Self::base_slot(cid, name, None)
    }

    pub fn base_slot(cid: ClassId, name: &'static str, slot: Option<i64>) -> Self {
        Self {
            cid,
            canonical: false,
            data: ObjectData::Base { name, slot },
        }
    }

    /// Cluster-allocated record awaiting fill.
    pub fn pending(cid: ClassId, canonical: bool) -> Self {
        Self {
            cid,
            canonical,
            data: ObjectData::Pending,
        }
    }

    pub fn with_data(cid: ClassId, canonical: bool, data: ObjectData) -> Self {
        Self {
            cid,
            canonical,
            data,
        }
    }

    #[inline]
    pub fn is_base(&self) -> bool {
        matches!(self.data, ObjectData::Base { .. })
    }

    /// Display name: base-object name, otherwise the class name.
    pub fn name(&self) -> String {
        match &self.data {
            ObjectData::Base { name, .. } => (*name).to_string(),
            ObjectData::Invalid => "INVALID".to_string(),
            _ => self.cid.to_string(),
        }
    }
}

/// Shared, append-only reference table.
#[derive(Debug, Clone)]
pub struct RefTable {
    inner: Rc<RefCell<Vec<ObjectRecord>>>,
}

impl Default for RefTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RefTable {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(vec![ObjectRecord::invalid()])),
        }
    }

    /// Append a record and return its reference.
    pub fn assign(&self, rec: ObjectRecord) -> RefIndex {
        let mut v = self.inner.borrow_mut();
        v.push(rec);
        v.len() - 1
    }

    /// Next reference to be assigned.
    #[inline]
    pub fn next_index(&self) -> RefIndex {
        self.inner.borrow().len()
    }

    /// Number of assigned references (slot 0 excluded).
    #[inline]
    pub fn assigned(&self) -> usize {
        self.next_index() - FIRST_REF
    }

    pub fn get(&self, r: RefIndex) -> Option<ObjectRecord> {
        if r == INVALID_REF {
            return None;
        }
        self.inner.borrow().get(r).cloned()
    }

    /// Mutate a record in place; returns false if `r` is not allocated.
    pub fn update<F: FnOnce(&mut ObjectRecord)>(&self, r: RefIndex, f: F) -> bool {
        match self.inner.borrow_mut().get_mut(r) {
            Some(rec) if r != INVALID_REF => {
                f(rec);
                true
            }
            _ => false,
        }
    }

    /// Drop every reference from `len` on. Slot 0 is never removed.
    pub fn truncate(&self, len: RefIndex) {
        self.inner.borrow_mut().truncate(len.max(FIRST_REF));
    }

    /// Borrow all records (index 0 is the INVALID sentinel).
    pub fn records(&self) -> Ref<'_, Vec<ObjectRecord>> {
        self.inner.borrow()
    }

    /// Same underlying storage (not merely equal contents).
    pub fn ptr_eq(&self, other: &RefTable) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
