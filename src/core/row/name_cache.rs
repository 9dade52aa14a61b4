//! 字段名到位置的缓存
//!
//! 键为小写字段名。缓存只是提示：命中后调用方必须确认该位置当前的名称
//! 仍然匹配，不匹配时删除该项并回退到线性查找。这样描述符改名后无需通知布局。
//! 并发读者同时回填同一个键得到的结果相同，竞争只会带来多余的工作。

use dashmap::DashMap;

#[derive(Debug, Default)]
pub(crate) struct NameCache {
    map: DashMap<String, usize>,
}

/// 名称是否相同（忽略大小写）
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl NameCache {
    pub fn get(&self, name: &str) -> Option<usize> {
        self.map.get(&key(name)).map(|entry| *entry.value())
    }

    /// 记录位置；已有记录时保留较小的位置
    pub fn store(&self, name: &str, position: usize) {
        if name.is_empty() {
            return;
        }
        self.map
            .entry(key(name))
            .and_modify(|p| *p = (*p).min(position))
            .or_insert(position);
    }

    /// 无条件覆盖
    pub fn replace(&self, name: &str, position: usize) {
        if !name.is_empty() {
            self.map.insert(key(name), position);
        }
    }

    pub fn remove(&self, name: &str) {
        self.map.remove(&key(name));
    }

    pub fn clear(&self) {
        self.map.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.map.len()
    }
}
