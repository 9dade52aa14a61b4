//! 稳定哈希
//!
//! 行哈希会被用于分组和分区，必须在进程之间保持一致，
//! 因此不能使用 `std` 默认的随机化哈希器。这里使用 MurmurHash2。

use std::hash::Hasher;

const M: u32 = 0x5bd1e995;
const R: u8 = 24;

/// 行哈希的初始种子
pub const ROW_HASH_SEED: u32 = 0x2f6b_1d0b;

/// 计算字节序列的 MurmurHash2
pub fn murmurhash2(data: &[u8], seed: u32) -> u32 {
    let mut h: u32 = seed ^ (data.len() as u32);
    let mut chunks = data.chunks_exact(4);

    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M) ^ k;
    }

    let tail = chunks.remainder();
    if tail.len() >= 3 {
        h ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        h ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        h ^= tail[0] as u32;
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^ (h >> 15)
}

/// 基于 MurmurHash2 的 `Hasher`，先缓冲全部输入，`finish` 时一次性计算
#[derive(Debug, Clone)]
pub struct StableHasher {
    seed: u32,
    buffer: Vec<u8>,
}

impl StableHasher {
    pub fn new() -> Self {
        Self::with_seed(ROW_HASH_SEED)
    }

    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            buffer: Vec::with_capacity(16),
        }
    }

    pub fn finish_u32(&self) -> u32 {
        murmurhash2(&self.buffer, self.seed)
    }
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for StableHasher {
    fn finish(&self) -> u64 {
        self.finish_u32() as u64
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn write_u8(&mut self, i: u8) {
        self.buffer.push(i);
    }

    fn write_u32(&mut self, i: u32) {
        self.buffer.extend_from_slice(&i.to_le_bytes());
    }

    fn write_u64(&mut self, i: u64) {
        self.buffer.extend_from_slice(&i.to_le_bytes());
    }

    fn write_i64(&mut self, i: i64) {
        self.buffer.extend_from_slice(&i.to_le_bytes());
    }
}

/// 把多个字段哈希合并为行哈希，顺序敏感
pub fn combine(acc: u64, field_hash: u32) -> u64 {
    acc.wrapping_mul(31).wrapping_add(field_hash as u64)
}
