//! End-to-end scenarios: full command streams driven through the manager,
//! with bookkeeping checked after every command byte.

use procsim::{parse_program, run_commands, ExitReason, Pid, ProcState, ProcessManager};

fn boot(source: &str) -> ProcessManager {
    ProcessManager::new(parse_program(source, "init.txt").unwrap())
}

/// Feed the command stream one byte at a time, verifying the manager's
/// bookkeeping between commands. Returns everything written to the dump
/// writer.
fn drive(manager: &mut ProcessManager, commands: &str) -> String {
    let mut out = Vec::new();
    for &byte in commands.as_bytes() {
        let reason = run_commands(manager, &[byte][..], &mut out).unwrap();
        manager.check_consistency();
        if reason == ExitReason::Terminated {
            break;
        }
    }
    String::from_utf8(out).unwrap()
}

#[test]
fn test_straight_line_program_runs_to_completion() {
    let mut mgr = boot("S 5\nA 3\nE\n");
    let out = drive(&mut mgr, "QQQT");

    assert_eq!(mgr.running(), None);
    assert_eq!(mgr.timestamp(), 3);
    assert_eq!(mgr.stats().terminated(), 1);
    assert_eq!(mgr.average_turnaround(), Some(3.0));
    assert_eq!(mgr.table()[Pid(0)].value, 8);
    assert_eq!(out, "average turnaround time: 3.00\n");
}

#[test]
fn test_fork_block_unblock_lifecycle() {
    let mut mgr = boot("F 2\nB\nA 1\nE\n");

    drive(&mut mgr, "Q");
    // Fork created the child suspended at the instruction after the F; the
    // parent skipped the two child-only instructions.
    assert_eq!(mgr.table().len(), 2);
    let child = &mgr.table()[Pid(1)];
    assert_eq!(child.parent, Some(Pid(0)));
    assert_eq!(child.program_counter, 1);
    assert_eq!(child.state, ProcState::Ready);
    assert_eq!(child.start_time, 1);
    assert_eq!(mgr.running(), Some(Pid(0)));

    drive(&mut mgr, "Q");
    // Parent hit its E; the child took the CPU.
    assert_eq!(mgr.stats().terminated(), 1);
    assert_eq!(mgr.running(), Some(Pid(1)));

    drive(&mut mgr, "Q");
    // Child blocked; its priority boost saturated at the most favored level.
    assert_eq!(mgr.running(), None);
    assert_eq!(mgr.table()[Pid(1)].state, ProcState::Blocked);
    assert_eq!(mgr.table()[Pid(1)].priority.level(), 0);

    drive(&mut mgr, "U");
    assert_eq!(mgr.running(), Some(Pid(1)));

    let out = drive(&mut mgr, "QQT");
    // Child ran A then E. Turnarounds: parent 2, child 4.
    assert_eq!(mgr.stats().terminated(), 2);
    assert_eq!(mgr.stats().cumulative(), 6);
    assert_eq!(mgr.table()[Pid(1)].value, 1);
    assert_eq!(out, "average turnaround time: 3.00\n");
}

#[test]
fn test_lone_process_is_never_preempted() {
    let mut mgr = boot("S 1\nA 1\nA 1\nA 1\nA 1\nA 1\nE\n");
    for _ in 0..6 {
        drive(&mut mgr, "Q");
        assert_eq!(mgr.running(), Some(Pid(0)), "sole process must keep the CPU");
    }
    let out = drive(&mut mgr, "QT");

    assert_eq!(mgr.table()[Pid(0)].value, 6);
    assert_eq!(mgr.table()[Pid(0)].state, ProcState::Terminated);
    assert_eq!(mgr.stats().terminated(), 1);
    assert_eq!(out, "average turnaround time: 7.00\n");
}

#[test]
fn test_block_dump_unblock_without_termination() {
    let mut mgr = boot("B\nE\n");
    let out = drive(&mut mgr, "QP");

    assert_eq!(mgr.running(), None);
    assert_eq!(mgr.table()[Pid(0)].state, ProcState::Blocked);
    assert!(out.contains("SYSTEM STATE AT TIME 1"));
    assert!(out.contains("RUNNING: none"));
    assert!(out.contains("BLOCKED: [pid=0 prio=0]"));

    let out = drive(&mut mgr, "UT");
    assert_eq!(mgr.running(), Some(Pid(0)));
    assert!(out.contains("no processes terminated"));
}

#[test]
fn test_unknown_command_bytes_change_nothing() {
    let mut clean = boot("S 5\nA 3\nE\n");
    let mut noisy = boot("S 5\nA 3\nE\n");

    drive(&mut clean, "QQ");
    drive(&mut noisy, "QX!Q#");

    assert_eq!(noisy.timestamp(), clean.timestamp());
    assert_eq!(
        noisy.snapshot().to_string(),
        clean.snapshot().to_string()
    );
}

#[test]
fn test_fork_with_negative_skip_kills_the_parent() {
    let mut mgr = boot("F -1\nE\n");
    drive(&mut mgr, "Q");

    assert_eq!(mgr.table().len(), 1, "no child may be created");
    assert_eq!(mgr.running(), None);
    assert_eq!(mgr.stats().terminated(), 1);
    assert_eq!(mgr.table()[Pid(0)].state, ProcState::Terminated);
}

#[test]
fn test_siblings_dispatch_in_pid_order() {
    // The parent forks two children (same priority), then exits; the
    // scheduler must hand the CPU to the lower PID first.
    let mut mgr = boot("F 1\nE\nF 1\nE\nE\n");

    drive(&mut mgr, "QQ");
    assert_eq!(mgr.table().len(), 3);
    drive(&mut mgr, "Q");
    // Parent terminated; first child dispatched.
    assert_eq!(mgr.running(), Some(Pid(1)));
    drive(&mut mgr, "Q");
    assert_eq!(mgr.running(), Some(Pid(2)));

    let out = drive(&mut mgr, "QT");
    assert_eq!(mgr.stats().terminated(), 3);
    assert_eq!(mgr.stats().cumulative(), 9);
    assert_eq!(out, "average turnaround time: 3.00\n");
}

#[test]
fn test_idle_quanta_still_advance_the_clock() {
    let mut mgr = boot("E\n");
    for expected in 1..=5 {
        drive(&mut mgr, "Q");
        assert_eq!(mgr.timestamp(), expected);
    }
    assert_eq!(mgr.stats().terminated(), 1);
}

#[test]
fn test_identical_runs_are_identical() {
    let init = "F 2\nB\nA 1\nE\n";
    let commands = "QPQQUPQQPT";

    let run = |_: u32| {
        let mut mgr = boot(init);
        let out = drive(&mut mgr, commands);
        (
            out,
            mgr.timestamp(),
            mgr.average_turnaround(),
            mgr.snapshot().to_string(),
        )
    };

    let first = run(0);
    let second = run(1);
    assert_eq!(first.0, second.0, "dump output must be identical");
    assert_eq!(first.1, second.1, "final timestamps must be identical");
    assert_eq!(first.2, second.2, "average turnaround must be identical");
    assert_eq!(first.3, second.3, "final state must be identical");
}

#[test]
fn test_eof_without_terminate_reports_nothing() {
    let mut mgr = boot("S 5\nA 3\nE\n");
    let mut out = Vec::new();
    let reason = run_commands(&mut mgr, "QQQ".as_bytes(), &mut out).unwrap();
    assert_eq!(reason, ExitReason::Disconnected);
    assert!(out.is_empty(), "no turnaround line on a broken pipe");
}
