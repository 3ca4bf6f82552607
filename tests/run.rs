use pretty_assertions::assert_eq;

use rv32i_rs::trace::{bin32, read_machine_code, render, render_machine_code, TraceFormat};
use rv32i_rs::{assemble, run, HaltReason, SimConfig};

const EXAMPLE: &str = "\
main:
    addi x1, x0, 5
    addi x2, x0, 3
    add  x3, x1, x2
    sw   x3, 0(x0)
    halt
";

fn run_src(src: &str, cfg: &SimConfig) -> rv32i_rs::RunResult {
    run(&assemble(src).unwrap(), cfg).unwrap()
}

#[test]
fn example_program_runs_to_halt() {
    let res = run_src(EXAMPLE, &SimConfig::default());
    assert_eq!(res.halt, HaltReason::Sentinel);
    assert_eq!(res.cpu.regs[3], 8);
    assert_eq!(res.memory.get(0), 8);

    let pcs: Vec<u32> = res.trace.iter().map(|s| s.pc).collect();
    assert_eq!(pcs, vec![4, 8, 12, 16, 16]);
    assert_eq!(res.trace[0].registers[1], 5);
    assert_eq!(res.trace[0].registers[2], 380);
    assert_eq!(res.trace[4], res.trace[3]);
}

#[test]
fn binary_trace_layout() {
    let res = run_src(EXAMPLE, &SimConfig::default());
    let out = render(&res, TraceFormat::Binary).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 5 + 32);

    for line in &lines[..5] {
        let tokens: Vec<&str> = line.split(' ').collect();
        assert_eq!(tokens.len(), 33);
        assert!(tokens.iter().all(|t| t.len() == 34 && t.starts_with("0b")));
    }
    let first: Vec<&str> = lines[0].split(' ').collect();
    assert_eq!(first[0], bin32(4));
    assert_eq!(first[2], bin32(5));
    assert_eq!(first[3], bin32(380));

    assert_eq!(lines[5], format!("0x00010000:{}", bin32(0)));
    assert_eq!(lines[36], format!("0x0001007C:{}", bin32(0)));
}

#[test]
fn negative_registers_print_twos_complement() {
    let res = run_src("addi x5, x0, -1\nhalt\n", &SimConfig::default());
    let out = render(&res, TraceFormat::Binary).unwrap();
    let first: Vec<&str> = out.lines().next().unwrap().split(' ').collect();
    assert_eq!(first[1 + 5], format!("0b{}", "1".repeat(32)));

    let dec = render(&res, TraceFormat::Decimal).unwrap();
    assert!(dec.starts_with("4 0 0 380 0 0 -1 0"));
}

#[test]
fn dump_shows_stores_into_reserved_range() {
    let src = "\
    lui  t0, 0x10000
    addi t1, x0, -2
    sw   t1, 8(t0)
    halt
";
    let res = run_src(src, &SimConfig::default());
    assert_eq!(res.dump[2], (0x0001_0008, 0xFFFF_FFFE));
    let out = render(&res, TraceFormat::Binary).unwrap();
    assert!(out.contains(&format!("0x00010008:0b{}10\n", "1".repeat(30))));
    let dec = render(&res, TraceFormat::Decimal).unwrap();
    assert!(dec.contains("0x00010008:-2\n"));
}

#[test]
fn falling_off_the_end_stops() {
    let res = run_src("addi x1, x0, 1\naddi x2, x1, 1\n", &SimConfig::default());
    assert_eq!(res.halt, HaltReason::FellOff);
    assert_eq!(res.trace.len(), 2);
    assert_eq!(res.trace[1].pc, 8);
    assert_eq!(res.cpu.regs[2], 2);
}

#[test]
fn jumping_outside_the_program_stops() {
    let res = run_src("jal x0, 64\n", &SimConfig::default());
    assert_eq!(res.halt, HaltReason::InvalidPc);
    assert_eq!(res.trace.len(), 1);

    let res = run_src("addi x1, x0, 2\njalr x0, 0(x1)\n", &SimConfig::default());
    // (2 + 0) & !1 == 2, not word aligned
    assert_eq!(res.halt, HaltReason::InvalidPc);
    assert_eq!(res.trace.last().unwrap().pc, 2);
}

#[test]
fn unknown_opcode_is_skipped() {
    let text = vec![0xFFFF_FFFF, 0x0010_0093, 0x63];
    let res = run(&text, &SimConfig::default()).unwrap();
    assert_eq!(res.halt, HaltReason::Sentinel);
    let pcs: Vec<u32> = res.trace.iter().map(|s| s.pc).collect();
    assert_eq!(pcs, vec![4, 8, 8]);
    assert_eq!(res.cpu.regs[1], 1);
    assert_eq!(res.skipped, vec![0]);

    let clean = run(&[0x0010_0093, 0x63], &SimConfig::default()).unwrap();
    assert!(clean.skipped.is_empty());
}

#[test]
fn step_limit_bounds_infinite_loops() {
    let cfg = SimConfig {
        max_steps: Some(10),
        ..SimConfig::default()
    };
    let res = run_src("loop: jal x0, loop\n", &cfg);
    assert_eq!(res.halt, HaltReason::StepLimit);
    assert_eq!(res.trace.len(), 10);
}

#[test]
fn config_changes_seed_and_dump() {
    let mut cfg = SimConfig::default();
    cfg.cpu.stack_pointer = 1024;
    cfg.dump_base = 0;
    cfg.dump_words = 2;
    let res = run_src(EXAMPLE, &cfg);
    assert_eq!(res.trace[0].registers[2], 1024);
    assert_eq!(res.dump, vec![(0, 8), (4, 0)]);
}

#[test]
fn runs_are_deterministic() {
    let text = read_machine_code(&render_machine_code(&assemble(EXAMPLE).unwrap())).unwrap();
    let a = run(&text, &SimConfig::default()).unwrap();
    let b = run(&text, &SimConfig::default()).unwrap();
    for format in [TraceFormat::Binary, TraceFormat::Decimal, TraceFormat::Json] {
        assert_eq!(render(&a, format).unwrap(), render(&b, format).unwrap());
    }
}

#[test]
fn json_trace() {
    let res = run_src(EXAMPLE, &SimConfig::default());
    let out = render(&res, TraceFormat::Json).unwrap();
    let v: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["halt"], "sentinel");
    assert_eq!(v["steps"].as_array().unwrap().len(), 5);
    assert_eq!(v["steps"][2]["pc"], 12);
    assert_eq!(v["steps"][2]["registers"][3], 8);
    assert_eq!(v["memory"][0]["address"], 0x10000);
    assert_eq!(v["memory"].as_array().unwrap().len(), 32);
}
