use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::Serialize;

use rv32i_rs::decoder::Decoder;
use rv32i_rs::instructions::Op;
use rv32i_rs::isa::rv32i::Rv32iDecoder;

use crate::model::{is_mapped, read_u32, Image};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Fallthrough,
    Branch,
    CondBranch,
    Call,
}

impl EdgeKind {
    pub fn short(self) -> &'static str {
        match self {
            EdgeKind::Fallthrough => "ft",
            EdgeKind::Branch => "br",
            EdgeKind::CondBranch => "cbr",
            EdgeKind::Call => "call",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: u32,
    pub to: u32,
    pub kind: EdgeKind,
}

/// Result of walking the control flow from a set of entry points.
#[derive(Debug, Clone, Default)]
pub struct Walk {
    pub visited: HashSet<u32>,
    pub edges: Vec<Edge>,
    /// Instructions that end a path: `halt`, `jalr x0` returns.
    pub exits: HashSet<u32>,
}

/// Breadth-first walk over decodable words reachable from `entries`.
pub fn analyze_entries(img: &Image, entries: &[u32], max_instr: usize) -> Walk {
    let dec = Rv32iDecoder::new();
    let mut walk = Walk::default();
    let mut queue: VecDeque<u32> = entries.iter().copied().filter(|&e| is_mapped(img, e)).collect();
    let mut steps = 0usize;

    while let Some(pc) = queue.pop_front() {
        if steps >= max_instr {
            break;
        }
        if !walk.visited.insert(pc) {
            continue;
        }
        let Some(d) = read_u32(img, pc).and_then(|raw| dec.decode(raw)) else {
            continue;
        };
        steps += 1;
        let ft = pc.wrapping_add(4);
        let tgt = pc.wrapping_add(d.imm as u32);
        let mut push = |walk: &mut Walk, to: u32, kind: EdgeKind| {
            walk.edges.push(Edge { from: pc, to, kind });
            if is_mapped(img, to) && !walk.visited.contains(&to) {
                queue.push_back(to);
            }
        };
        match d.op {
            Op::Jal if d.rd == 0 => push(&mut walk, tgt, EdgeKind::Branch),
            Op::Jal => {
                push(&mut walk, tgt, EdgeKind::Call);
                push(&mut walk, ft, EdgeKind::Fallthrough);
            }
            Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu => {
                push(&mut walk, tgt, EdgeKind::CondBranch);
                if is_mapped(img, ft) {
                    push(&mut walk, ft, EdgeKind::Fallthrough);
                }
            }
            // Indirect: only the return path of a linking jalr is known.
            Op::Jalr if d.rd != 0 => {
                if is_mapped(img, ft) {
                    push(&mut walk, ft, EdgeKind::Fallthrough);
                }
            }
            Op::Jalr | Op::Halt => {
                walk.exits.insert(pc);
            }
            _ => {
                if is_mapped(img, ft) {
                    push(&mut walk, ft, EdgeKind::Fallthrough);
                }
            }
        }
    }
    walk
}

#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeOut {
    pub from: u32,
    pub to: u32,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionOut {
    pub entry: u32,
    pub blocks: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelOut {
    pub addr: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub entries: Vec<u32>,
    pub instructions: usize,
    pub blocks: Vec<Block>,
    pub edges: Vec<EdgeOut>,
    pub functions: Vec<FunctionOut>,
    pub labels: Vec<LabelOut>,
}

/// Splits the walk into basic blocks and names them.
pub fn build_report(img: &Image, seeds: &[u32], max_instr: usize) -> Report {
    let walk = analyze_entries(img, seeds, max_instr);

    // Block starts: entries, jump targets and the word after each branch or call.
    let mut starts: Vec<u32> = seeds
        .iter()
        .copied()
        .chain(walk.edges.iter().flat_map(|e| match e.kind {
            EdgeKind::Fallthrough => vec![],
            EdgeKind::Branch => vec![e.to],
            EdgeKind::CondBranch | EdgeKind::Call => vec![e.to, e.from.wrapping_add(4)],
        }))
        .filter(|a| walk.visited.contains(a))
        .collect();
    starts.sort_unstable();
    starts.dedup();

    let mut blocks = Vec::new();
    let mut addr_to_block: HashMap<u32, u32> = HashMap::new();
    for &start in &starts {
        let mut cur = start;
        loop {
            addr_to_block.insert(cur, start);
            let next = cur.wrapping_add(4);
            let jumps = walk
                .edges
                .iter()
                .any(|e| e.from == cur && e.kind == EdgeKind::Branch);
            if jumps
                || walk.exits.contains(&cur)
                || !walk.visited.contains(&next)
                || starts.binary_search(&next).is_ok()
            {
                blocks.push(Block { start, end: next });
                break;
            }
            cur = next;
        }
    }

    let edges: Vec<EdgeOut> = walk
        .edges
        .iter()
        .filter(|e| e.kind != EdgeKind::Fallthrough || starts.binary_search(&e.to).is_ok())
        .map(|e| EdgeOut {
            from: addr_to_block.get(&e.from).copied().unwrap_or(e.from),
            to: e.to,
            kind: e.kind,
        })
        .collect();

    let mut adj: HashMap<u32, Vec<u32>> = HashMap::new();
    for e in &edges {
        adj.entry(e.from).or_default().push(e.to);
    }
    let functions = seeds
        .iter()
        .map(|&entry| {
            let mut seen = HashSet::new();
            let mut q = VecDeque::from([entry]);
            while let Some(b) = q.pop_front() {
                if seen.insert(b) {
                    q.extend(adj.get(&b).into_iter().flatten().copied());
                }
            }
            let mut blocks: Vec<u32> = seen
                .into_iter()
                .filter(|b| starts.binary_search(b).is_ok())
                .collect();
            blocks.sort_unstable();
            FunctionOut { entry, blocks }
        })
        .collect();

    let mut names: BTreeMap<u32, String> = BTreeMap::new();
    for &e in seeds {
        names.insert(e, format!("sub_{e:08x}"));
    }
    for b in &blocks {
        names
            .entry(b.start)
            .or_insert_with(|| format!("loc_{:08x}", b.start));
    }

    Report {
        entries: seeds.to_vec(),
        instructions: walk.visited.len(),
        blocks,
        edges,
        functions,
        labels: names
            .into_iter()
            .map(|(addr, name)| LabelOut { addr, name })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32i_rs::assemble;

    fn image(src: &str) -> Image {
        Image::new(0, assemble(src).unwrap())
    }

    #[test]
    fn loop_edges_and_blocks() {
        let img = image(
            "\
    addi x1, x0, 3
loop:
    addi x1, x1, -1
    bne  x1, x0, loop
    halt
",
        );
        let walk = analyze_entries(&img, &[0], 100);
        assert_eq!(walk.visited.len(), 4);
        assert!(walk
            .edges
            .contains(&Edge { from: 8, to: 4, kind: EdgeKind::CondBranch }));
        assert!(walk
            .edges
            .contains(&Edge { from: 8, to: 12, kind: EdgeKind::Fallthrough }));
        assert!(walk.exits.contains(&12));

        let report = build_report(&img, &[0], 100);
        let spans: Vec<(u32, u32)> = report.blocks.iter().map(|b| (b.start, b.end)).collect();
        assert_eq!(spans, vec![(0, 4), (4, 12), (12, 16)]);
        assert_eq!(report.functions[0].blocks, vec![0, 4, 12]);
        let edges: Vec<(u32, u32, EdgeKind)> =
            report.edges.iter().map(|e| (e.from, e.to, e.kind)).collect();
        assert_eq!(
            edges,
            vec![
                (0, 4, EdgeKind::Fallthrough),
                (4, 4, EdgeKind::CondBranch),
                (4, 12, EdgeKind::Fallthrough),
            ]
        );
        assert_eq!(report.labels[0].name, "sub_00000000");
        assert_eq!(report.labels[1].name, "loc_00000004");
    }

    #[test]
    fn call_and_return() {
        let img = image(
            "\
    jal  ra, f
    halt
f:
    jalr x0, 0(ra)
",
        );
        let walk = analyze_entries(&img, &[0], 100);
        assert!(walk
            .edges
            .contains(&Edge { from: 0, to: 8, kind: EdgeKind::Call }));
        assert!(walk
            .edges
            .contains(&Edge { from: 0, to: 4, kind: EdgeKind::Fallthrough }));
        assert!(walk.exits.contains(&8));
        assert!(walk.exits.contains(&4));
    }

    #[test]
    fn max_instr_bounds_the_walk() {
        let img = image("addi x1, x0, 1\naddi x1, x0, 2\naddi x1, x0, 3\n");
        assert_eq!(analyze_entries(&img, &[0], 2).visited.len(), 2);
    }
}
