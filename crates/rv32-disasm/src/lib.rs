pub mod analyze;
pub mod model;

use std::collections::BTreeSet;
use std::fmt::Write as _;

use rv32i_rs::decoder::Decoder;
use rv32i_rs::disasm::{fmt_decoded, fmt_decoded_labeled, is_pc_relative};
use rv32i_rs::isa::rv32i::Rv32iDecoder;

pub use analyze::{analyze_entries, build_report, Block, Edge, EdgeKind, EdgeOut, FunctionOut, Report};
pub use model::{is_mapped, load_machine_code, read_u32, Image};

/// Label for a jump target inside the image.
pub fn target_label(addr: u32) -> String {
    format!("L{addr:08x}")
}

/// Addresses inside `img` reached by a branch or `jal`.
pub fn branch_targets(img: &Image) -> BTreeSet<u32> {
    let dec = Rv32iDecoder::new();
    img.iter()
        .filter_map(|(pc, raw)| {
            let d = dec.decode(raw)?;
            let tgt = pc.wrapping_add(d.imm as u32);
            (is_pc_relative(d.op) && read_u32(img, tgt).is_some()).then_some(tgt)
        })
        .collect()
}

/// Address-annotated listing of every word in `img`.
///
/// With `labels`, in-image targets are named and the text assembles back
/// to the same words as long as every word decodes.
pub fn render_listing(img: &Image, labels: bool) -> String {
    let dec = Rv32iDecoder::new();
    let targets = if labels { branch_targets(img) } else { BTreeSet::new() };
    let mut out = String::new();
    for (pc, raw) in img.iter() {
        if targets.contains(&pc) {
            let _ = writeln!(out, "{}:", target_label(pc));
        }
        let text = match dec.decode(raw) {
            Some(d) => {
                let tgt = pc.wrapping_add(d.imm as u32);
                if is_pc_relative(d.op) && targets.contains(&tgt) {
                    fmt_decoded_labeled(&d, Some(&target_label(tgt)))
                } else {
                    fmt_decoded(&d)
                }
            }
            None => format!(".word {raw:#010x}"),
        };
        let _ = writeln!(out, "    {text:<28} # {pc:#010x}");
    }
    out
}
