use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub trait Bus {
    fn read_u32(&mut self, addr: u32) -> Result<u32>;
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()>;
}

/// Sparse data memory: one 32-bit word per byte address that was written.
///
/// Addresses are keys, not offsets into a byte array, so a word stored at
/// `0x101` is only visible to loads from exactly `0x101`. Unwritten
/// addresses read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMemory {
    words: BTreeMap<u32, u32>,
}

impl DataMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory with `count` zero words reserved from `base` upwards.
    pub fn reserved(base: u32, count: u32) -> Self {
        let mut mem = Self::new();
        for i in 0..count {
            mem.words.insert(base.wrapping_add(i.wrapping_mul(4)), 0);
        }
        mem
    }

    pub fn get(&self, addr: u32) -> u32 {
        self.words.get(&addr).copied().unwrap_or(0)
    }

    /// `count` consecutive words from `base`, whether touched or not.
    pub fn dump(&self, base: u32, count: u32) -> Vec<(u32, u32)> {
        (0..count)
            .map(|i| {
                let addr = base.wrapping_add(i.wrapping_mul(4));
                (addr, self.get(addr))
            })
            .collect()
    }

    /// Every address holding a word, in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words.iter().map(|(&a, &v)| (a, v))
    }
}

impl Bus for DataMemory {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        Ok(self.get(addr))
    }
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()> {
        self.words.insert(addr, val);
        Ok(())
    }
}
