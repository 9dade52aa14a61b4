//! 共享的描述符句柄
//!
//! 同一个描述符可以同时出现在多个布局中，名称等属性的修改对所有持有者可见。
//! 每个句柄在创建时分配一个进程内唯一的实例编号，布局用它判断
//! 两个位置是否引用了同一个描述符实例。

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::value_meta::ValueMeta;
use crate::core::value::ValueType;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub struct ValueMetaRef {
    id: u64,
    inner: Arc<RwLock<ValueMeta>>,
}

impl ValueMetaRef {
    pub fn new(meta: ValueMeta) -> Self {
        Self {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            inner: Arc::new(RwLock::new(meta)),
        }
    }

    /// 实例编号，克隆句柄时保持不变
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ValueMeta> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ValueMeta> {
        self.inner.write()
    }

    /// 两个句柄是否指向同一个描述符
    pub fn ptr_eq(&self, other: &ValueMetaRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 当前内容的独立副本
    pub fn snapshot(&self) -> ValueMeta {
        self.inner.read().clone()
    }

    /// 复制出一个新的描述符实例
    pub fn detach(&self) -> ValueMetaRef {
        ValueMetaRef::new(self.snapshot())
    }

    pub fn name(&self) -> String {
        self.inner.read().name().to_string()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.inner.write().set_name(name);
    }

    pub fn value_type(&self) -> ValueType {
        self.inner.read().value_type()
    }
}

impl From<ValueMeta> for ValueMetaRef {
    fn from(meta: ValueMeta) -> Self {
        ValueMetaRef::new(meta)
    }
}

impl fmt::Debug for ValueMetaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueMetaRef")
            .field("id", &self.id)
            .field("meta", &*self.inner.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_instance() {
        let a = ValueMetaRef::new(ValueMeta::new("a", ValueType::String));
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        assert!(a.ptr_eq(&b));

        b.set_name("renamed");
        assert_eq!(a.name(), "renamed");
    }

    #[test]
    fn test_detach_creates_new_instance() {
        let a = ValueMetaRef::new(ValueMeta::new("a", ValueType::Integer));
        let c = a.detach();
        assert_ne!(a.id(), c.id());
        assert!(!a.ptr_eq(&c));

        c.set_name("c");
        assert_eq!(a.name(), "a");
        assert_eq!(c.value_type(), ValueType::Integer);
    }
}
