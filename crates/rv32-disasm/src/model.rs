use anyhow::{Context, Result};
use std::path::Path;

/// A machine-code file mapped at `base`, one word per 4 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub base: u32,
    pub words: Vec<u32>,
}

impl Image {
    pub fn new(base: u32, words: Vec<u32>) -> Self {
        Self { base, words }
    }

    /// First address past the last word.
    pub fn end(&self) -> u32 {
        self.base.wrapping_add((self.words.len() as u32).wrapping_mul(4))
    }

    /// `(address, word)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(i, &w)| (self.base.wrapping_add(i as u32 * 4), w))
    }
}

pub fn load_machine_code(path: &Path, base: u32) -> Result<Image> {
    let words = rv32i_rs::trace::load_machine_code(path)
        .with_context(|| format!("loading {}", path.display()))?;
    anyhow::ensure!(base % 4 == 0, "--base must be word aligned");
    Ok(Image::new(base, words))
}

pub fn read_u32(img: &Image, addr: u32) -> Option<u32> {
    if !is_mapped(img, addr) || (addr - img.base) % 4 != 0 {
        return None;
    }
    img.words.get(((addr - img.base) / 4) as usize).copied()
}

pub fn is_mapped(img: &Image, addr: u32) -> bool {
    addr >= img.base && addr < img.end()
}
