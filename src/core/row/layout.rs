//! 行布局
//!
//! [`RowLayout`] 是一行的有序描述符序列，负责：
//!
//! - 重名处理：新加入的描述符与已有名称（忽略大小写）冲突时改名为 `<名称>_<n>`
//! - 名称查找：通过 [`NameCache`] 实现均摊 O(1) 的 `index_of`
//! - 克隆集合：复制行时需要深拷贝的位置
//! - 基于描述符的行级访问、比较与哈希

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::name_cache::{same_name, NameCache};
use crate::core::convert::ValueConverter;
use crate::core::error::{RowError, RowResult};
use crate::core::meta::{ValueMeta, ValueMetaRef};
use crate::core::value::hash::{combine, ROW_HASH_SEED};
use crate::core::value::{Row, Value, ValueType};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
struct Slot {
    meta: ValueMetaRef,
    /// 描述符实例编号；因重名而复制出的描述符沿用原实例的编号
    instance: u64,
}

#[derive(Debug)]
struct CloneSet {
    signature: Vec<(u64, bool)>,
    positions: Arc<[usize]>,
}

pub struct RowLayout {
    slots: Vec<Slot>,
    names: NameCache,
    clone_set: Mutex<Option<CloneSet>>,
    converter: Arc<ValueConverter>,
}

impl RowLayout {
    pub fn new() -> Self {
        Self::with_converter(Arc::new(ValueConverter::default()))
    }

    pub fn with_converter(converter: Arc<ValueConverter>) -> Self {
        Self {
            slots: Vec::new(),
            names: NameCache::default(),
            clone_set: Mutex::new(None),
            converter,
        }
    }

    pub fn converter(&self) -> &Arc<ValueConverter> {
        &self.converter
    }

    pub fn set_converter(&mut self, converter: Arc<ValueConverter>) {
        self.converter = converter;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&ValueMetaRef> {
        self.slots.get(position).map(|s| &s.meta)
    }

    /// 只读的描述符视图
    pub fn descriptors(&self) -> impl ExactSizeIterator<Item = &ValueMetaRef> + '_ {
        self.slots.iter().map(|s| &s.meta)
    }

    /// 描述符句柄列表的副本
    pub fn value_meta_list(&self) -> Vec<ValueMetaRef> {
        self.descriptors().cloned().collect()
    }

    fn invalidate_clone_set(&mut self) {
        *self.clone_set.get_mut() = None;
    }

    // ---------------------------------------------------------------
    // 结构修改
    // ---------------------------------------------------------------

    /// 选出 `<base>_<n>` 中最小的未被占用的名称
    fn unique_name(&self, base: &str, skip: Option<usize>) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.name_taken(&candidate, skip) {
                return candidate;
            }
            n += 1;
        }
    }

    fn name_taken(&self, name: &str, skip: Option<usize>) -> bool {
        match skip {
            None => self.index_of(name).is_some(),
            Some(skip) => self
                .slots
                .iter()
                .enumerate()
                .any(|(i, s)| i != skip && same_name(s.meta.read().name(), name)),
        }
    }

    /// 处理重名，返回实际存放的槽位
    fn prepare(&self, meta: ValueMetaRef, skip: Option<usize>) -> Slot {
        let instance = meta.id();
        let name = meta.name();
        if name.is_empty() || !self.name_taken(&name, skip) {
            return Slot { meta, instance };
        }
        let renamed = self.unique_name(&name, skip);
        log::debug!("field '{}' already exists, renamed to '{}'", name, renamed);
        let copy = meta.detach();
        copy.set_name(renamed);
        Slot {
            meta: copy,
            instance,
        }
    }

    /// 追加描述符，不校验存储配置（从 JSON 恢复的 INDEXED 描述符此时还没有字典表）
    pub fn append(&mut self, meta: impl Into<ValueMetaRef>) {
        let slot = self.prepare(meta.into(), None);
        let position = self.slots.len();
        self.names.store(&slot.meta.name(), position);
        self.slots.push(slot);
        self.invalidate_clone_set();
    }

    pub fn insert_at(&mut self, position: usize, meta: impl Into<ValueMetaRef>) -> RowResult<()> {
        if position > self.slots.len() {
            return Err(RowError::structural(format!(
                "insert position {} beyond layout size {}",
                position,
                self.slots.len()
            )));
        }
        let meta = meta.into();
        meta.read().validate()?;
        let slot = self.prepare(meta, None);
        self.slots.insert(position, slot);
        self.names.clear();
        self.invalidate_clone_set();
        Ok(())
    }

    /// 替换某个位置的描述符，名称只与其他位置比较；存储配置不完整时报错
    pub fn set(&mut self, position: usize, meta: impl Into<ValueMetaRef>) -> RowResult<()> {
        if position >= self.slots.len() {
            return Err(RowError::structural(format!(
                "position {} out of range (size {})",
                position,
                self.slots.len()
            )));
        }
        let meta = meta.into();
        meta.read().validate()?;
        let slot = self.prepare(meta, Some(position));
        self.slots[position] = slot;
        self.names.clear();
        self.invalidate_clone_set();
        Ok(())
    }

    /// 整体替换，不做重名处理；任一描述符的存储配置不完整时不做任何修改
    pub fn set_all(&mut self, metas: Vec<ValueMetaRef>) -> RowResult<()> {
        for meta in &metas {
            meta.read().validate()?;
        }
        self.slots = metas
            .into_iter()
            .map(|meta| Slot {
                instance: meta.id(),
                meta,
            })
            .collect();
        self.names.clear();
        for (i, slot) in self.slots.iter().enumerate() {
            self.names.store(slot.meta.read().name(), i);
        }
        self.invalidate_clone_set();
        Ok(())
    }

    /// 追加另一个布局的全部描述符，逐个应用重名规则
    pub fn append_all(&mut self, other: &RowLayout) {
        for meta in other.descriptors() {
            self.append(meta.clone());
        }
    }

    /// 只追加本布局中不存在的名称；给出 `origin` 时写入追加的描述符
    pub fn merge_distinct(&mut self, other: &RowLayout, origin: Option<&str>) {
        for meta in other.descriptors() {
            let name = meta.name();
            if !name.is_empty() && self.exists(&name) {
                continue;
            }
            match origin {
                Some(label) => {
                    let copy = meta.detach();
                    copy.write().set_origin(Some(label.to_string()));
                    self.append(copy);
                }
                None => self.append(meta.clone()),
            }
        }
    }

    pub fn remove_at(&mut self, position: usize) -> RowResult<ValueMetaRef> {
        if position >= self.slots.len() {
            return Err(RowError::structural(format!(
                "position {} out of range (size {})",
                position,
                self.slots.len()
            )));
        }
        let slot = self.slots.remove(position);
        self.names.clear();
        self.invalidate_clone_set();
        Ok(slot.meta)
    }

    pub fn remove_by_name(&mut self, name: &str) -> RowResult<ValueMetaRef> {
        let position = self
            .index_of(name)
            .ok_or_else(|| RowError::structural(format!("field '{}' not found", name)))?;
        self.remove_at(position)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.names.clear();
        self.invalidate_clone_set();
    }

    // ---------------------------------------------------------------
    // 名称查找
    // ---------------------------------------------------------------

    /// 按名称（忽略大小写）查找位置，空名称总是找不到
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        if let Some(position) = self.names.get(name) {
            let valid = self
                .slots
                .get(position)
                .is_some_and(|s| same_name(s.meta.read().name(), name));
            if valid {
                return Some(position);
            }
            self.names.remove(name);
        }
        let position = self
            .slots
            .iter()
            .position(|s| same_name(s.meta.read().name(), name))?;
        self.names.replace(name, position);
        Some(position)
    }

    /// 按名称查找描述符，返回的句柄与布局共享
    pub fn find(&self, name: &str) -> Option<ValueMetaRef> {
        self.index_of(name).and_then(|i| self.get(i)).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// 所有字段名，未命名的位置为空字符串
    pub fn field_names(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.meta.name()).collect()
    }

    /// 形如 `name    (Integer(5))` 的说明，名称补齐到最长名称的宽度
    pub fn field_names_and_types(&self) -> Vec<String> {
        let width = self
            .slots
            .iter()
            .map(|s| s.meta.read().name().chars().count())
            .max()
            .unwrap_or(0);
        self.slots
            .iter()
            .map(|s| {
                let meta = s.meta.read();
                format!("{:<width$}   ({})", meta.name(), meta.to_string_meta(), width = width)
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // 克隆集合
    // ---------------------------------------------------------------

    fn clone_signature(&self) -> Vec<(u64, bool)> {
        self.slots
            .iter()
            .map(|s| (s.instance, s.meta.read().requires_real_clone()))
            .collect()
    }

    /// 复制行时需要深拷贝的位置
    ///
    /// 包含值类型需要深拷贝的位置，以及同一描述符实例出现在多个位置时的全部位置。
    pub fn clone_set(&self) -> Arc<[usize]> {
        let signature = self.clone_signature();
        let mut cached = self.clone_set.lock();
        if let Some(set) = cached.as_ref() {
            if set.signature == signature {
                return set.positions.clone();
            }
        }

        let mut occurrences: HashMap<u64, usize> = HashMap::new();
        for (instance, _) in &signature {
            *occurrences.entry(*instance).or_default() += 1;
        }
        let positions: Arc<[usize]> = signature
            .iter()
            .enumerate()
            .filter(|(_, (instance, real))| *real || occurrences[instance] > 1)
            .map(|(i, _)| i)
            .collect();
        log::trace!("clone set computed: {:?}", positions);

        *cached = Some(CloneSet {
            signature,
            positions: positions.clone(),
        });
        positions
    }

    /// 克隆集合是否已经计算（结构修改后重置）
    pub fn is_clone_set_computed(&self) -> bool {
        self.clone_set.lock().is_some()
    }

    /// 复制一行：克隆集合中的位置深拷贝，其余位置共享
    pub fn clone_row(&self, row: &[Value]) -> Row {
        let deep = self.clone_set();
        let mut copy = row.to_vec();
        for &i in deep.iter() {
            if let (Some(slot), Some(value)) = (self.slots.get(i), row.get(i)) {
                copy[i] = self.converter.clone_value(&slot.meta.read(), value);
            }
        }
        copy
    }

    // ---------------------------------------------------------------
    // 派生布局
    // ---------------------------------------------------------------

    /// 所有描述符都改为指定类型的深拷贝
    pub fn clone_to_type(&self, value_type: ValueType) -> RowLayout {
        let copy = self.clone();
        for slot in &copy.slots {
            slot.meta.write().set_value_type(value_type);
        }
        copy
    }

    /// 以 JSON 数组保存所有描述符
    pub fn to_json(&self) -> RowResult<String> {
        let metas: Vec<ValueMeta> = self.slots.iter().map(|s| s.meta.snapshot()).collect();
        serde_json::to_string_pretty(&metas).map_err(|e| RowError::structural(e.to_string()))
    }

    pub fn from_json(json: &str) -> RowResult<RowLayout> {
        Self::from_json_with(json, Arc::new(ValueConverter::default()))
    }

    pub fn from_json_with(json: &str, converter: Arc<ValueConverter>) -> RowResult<RowLayout> {
        let metas: Vec<ValueMeta> =
            serde_json::from_str(json).map_err(|e| RowError::structural(e.to_string()))?;
        let mut layout = RowLayout::with_converter(converter);
        for meta in metas {
            layout.append(meta);
        }
        Ok(layout)
    }

    // ---------------------------------------------------------------
    // 行访问
    // ---------------------------------------------------------------

    fn slot(&self, position: usize) -> RowResult<&Slot> {
        self.slots.get(position).ok_or_else(|| {
            RowError::structural(format!(
                "position {} out of range (size {})",
                position,
                self.slots.len()
            ))
        })
    }

    pub fn get_string(&self, row: &[Value], position: usize) -> RowResult<Option<String>> {
        let meta = self.slot(position)?.meta.read();
        self.converter.get_string(&meta, value_at(row, position))
    }

    pub fn get_integer(&self, row: &[Value], position: usize) -> RowResult<Option<i64>> {
        let meta = self.slot(position)?.meta.read();
        self.converter.get_integer(&meta, value_at(row, position))
    }

    pub fn get_number(&self, row: &[Value], position: usize) -> RowResult<Option<f64>> {
        let meta = self.slot(position)?.meta.read();
        self.converter.get_number(&meta, value_at(row, position))
    }

    pub fn get_big_number(
        &self,
        row: &[Value],
        position: usize,
    ) -> RowResult<Option<BigDecimal>> {
        let meta = self.slot(position)?.meta.read();
        self.converter.get_big_number(&meta, value_at(row, position))
    }

    pub fn get_boolean(&self, row: &[Value], position: usize) -> RowResult<Option<bool>> {
        let meta = self.slot(position)?.meta.read();
        self.converter.get_boolean(&meta, value_at(row, position))
    }

    pub fn get_date(&self, row: &[Value], position: usize) -> RowResult<Option<DateTime<Utc>>> {
        let meta = self.slot(position)?.meta.read();
        self.converter.get_date(&meta, value_at(row, position))
    }

    pub fn get_binary(&self, row: &[Value], position: usize) -> RowResult<Option<Arc<[u8]>>> {
        let meta = self.slot(position)?.meta.read();
        self.converter.get_binary(&meta, value_at(row, position))
    }

    /// 按名称取字符串；字段不存在时返回 `default`，字段存在但值为空时返回 `None`
    pub fn get_string_or(
        &self,
        row: &[Value],
        name: &str,
        default: &str,
    ) -> RowResult<Option<String>> {
        match self.index_of(name) {
            Some(position) => self.get_string(row, position),
            None => Ok(Some(default.to_string())),
        }
    }

    /// 按名称取整数；字段不存在时返回 `default`，字段存在但值为空时返回 `None`
    pub fn get_integer_or(&self, row: &[Value], name: &str, default: i64) -> RowResult<Option<i64>> {
        match self.index_of(name) {
            Some(position) => self.get_integer(row, position),
            None => Ok(Some(default)),
        }
    }

    pub fn is_null(&self, row: &[Value], position: usize) -> RowResult<bool> {
        let meta = self.slot(position)?.meta.read();
        self.converter.is_null(&meta, value_at(row, position))
    }

    /// 形如 `[a], [12], [<null>]` 的文本
    pub fn row_to_string(&self, row: &[Value]) -> RowResult<String> {
        let mut parts = Vec::with_capacity(self.slots.len());
        for (i, slot) in self.slots.iter().enumerate() {
            let meta = slot.meta.read();
            let text = self.converter.convert_to_string(&meta, value_at(row, i))?;
            parts.push(format!("[{}]", text));
        }
        Ok(parts.join(", "))
    }

    // ---------------------------------------------------------------
    // 行比较与哈希
    // ---------------------------------------------------------------

    /// 按所有位置依次比较
    pub fn compare_rows(&self, a: &[Value], b: &[Value]) -> RowResult<Ordering> {
        for i in 0..self.slots.len() {
            let ordering = self.compare_at(a, b, i)?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    /// 按给定位置依次比较
    pub fn compare_rows_on(
        &self,
        a: &[Value],
        b: &[Value],
        positions: &[usize],
    ) -> RowResult<Ordering> {
        for &i in positions {
            let ordering = self.compare_at(a, b, i)?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    fn compare_at(&self, a: &[Value], b: &[Value], position: usize) -> RowResult<Ordering> {
        let meta = self.slot(position)?.meta.read();
        self.converter
            .compare(&meta, value_at(a, position), value_at(b, position))
    }

    /// 比较两种布局下的行，`positions_a[i]` 与 `positions_b[i]` 配对
    pub fn compare_rows_with(
        &self,
        a: &[Value],
        other: &RowLayout,
        b: &[Value],
        positions_a: &[usize],
        positions_b: &[usize],
    ) -> RowResult<Ordering> {
        if positions_a.len() != positions_b.len() {
            return Err(RowError::structural(format!(
                "position lists differ in length: {} vs {}",
                positions_a.len(),
                positions_b.len()
            )));
        }
        for (&pa, &pb) in positions_a.iter().zip(positions_b) {
            let meta_a = self.slot(pa)?.meta.read();
            let meta_b = other.slot(pb)?.meta.read();
            let ordering = self.converter.compare_with(
                &meta_a,
                value_at(a, pa),
                &meta_b,
                value_at(b, pb),
            )?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    pub fn rows_equal_on(&self, a: &[Value], b: &[Value], positions: &[usize]) -> RowResult<bool> {
        Ok(self.compare_rows_on(a, b, positions)? == Ordering::Equal)
    }

    /// 所有位置的行哈希
    pub fn hash_row(&self, row: &[Value]) -> RowResult<u64> {
        let positions: Vec<usize> = (0..self.slots.len()).collect();
        self.hash_row_on(row, &positions)
    }

    /// 给定位置的行哈希，跨进程稳定
    pub fn hash_row_on(&self, row: &[Value], positions: &[usize]) -> RowResult<u64> {
        let mut hash = ROW_HASH_SEED as u64;
        for &i in positions {
            let meta = self.slot(i)?.meta.read();
            hash = combine(hash, self.converter.hash_value(&meta, value_at(row, i))?);
        }
        Ok(hash)
    }
}

/// 行中缺失的位置按空值处理
fn value_at(row: &[Value], position: usize) -> &Value {
    const NULL: &Value = &Value::Null;
    row.get(position).unwrap_or(NULL)
}

impl Default for RowLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// 深拷贝：每个描述符都复制为新实例，原布局中的重复实例在副本中仍然是重复的
impl Clone for RowLayout {
    fn clone(&self) -> Self {
        let mut lineage: HashMap<u64, ValueMetaRef> = HashMap::new();
        let mut copy = RowLayout::with_converter(self.converter.clone());
        for slot in &self.slots {
            let meta = slot.meta.detach();
            let instance = lineage
                .entry(slot.instance)
                .or_insert_with(|| meta.clone())
                .id();
            copy.slots.push(Slot { meta, instance });
        }
        for (i, slot) in copy.slots.iter().enumerate() {
            copy.names.store(slot.meta.read().name(), i);
        }
        copy
    }
}

impl fmt::Debug for RowLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| s.meta.read().to_string()))
            .finish()
    }
}

impl fmt::Display for RowLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self.slots.iter().map(|s| s.meta.read().to_string()).collect();
        write!(f, "[{}]", fields.join(", "))
    }
}
