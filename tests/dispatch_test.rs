/*!
 * Dispatch Tests
 * Raise → raw-handler → safe-point-drain → callback lifecycle
 *
 * Signal dispositions and the registration table are process-wide, so every
 * test here is serialized and each uses its own kinds where possible.
 */

use parking_lot::Mutex;
use serial_test::serial;
use sigtramp::{
    CatchOptions, SafePoint, SignalCatching, SignalDispatcher, SignalError, SignalKind,
    SignalMasking, SignalSet,
};
use std::sync::Arc;

fn dispatcher() -> SignalDispatcher {
    let _ = env_logger::builder().is_test(true).try_init();
    let d = SignalDispatcher::new();
    // Flush observation state left by earlier tests in this binary.
    let _ = d.caught_any();
    d
}

fn kind(name: &str) -> SignalKind {
    SignalKind::from_name(name).unwrap()
}

#[test]
#[serial]
fn raise_then_drain_marks_caught_exactly_once() {
    let d = dispatcher();
    let urg = kind("urg");
    d.catch(urg, None, CatchOptions::default()).unwrap();

    d.raise(urg).unwrap();
    d.poll_safe_point().unwrap();

    assert!(d.caught(urg));
    assert!(!d.caught(urg));

    d.ignore(&[urg]).unwrap();
}

#[test]
#[serial]
fn callback_receives_symbolic_name() {
    let d = dispatcher();
    let usr1 = kind("usr1");
    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let record = seen.clone();
    d.catch(
        usr1,
        Some(Box::new(move |name| {
            record.lock().push(name);
            Ok(())
        })),
        CatchOptions::default(),
    )
    .unwrap();

    d.raise(usr1).unwrap();
    let invoked = d.poll_safe_point().unwrap();

    assert_eq!(invoked, 1);
    assert_eq!(*seen.lock(), vec!["usr1"]);
    // The drain consumed the trigger on behalf of the callback.
    assert!(!d.caught(usr1));

    d.ignore(&[usr1]).unwrap();
}

#[test]
#[serial]
fn ignore_after_catch_never_invokes() {
    let d = dispatcher();
    let usr2 = kind("usr2");
    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let record = seen.clone();
    d.catch(
        usr2,
        Some(Box::new(move |name| {
            record.lock().push(name);
            Ok(())
        })),
        CatchOptions::default(),
    )
    .unwrap();
    d.ignore(&[usr2]).unwrap();

    d.raise(usr2).unwrap();
    let invoked = d.poll_safe_point().unwrap();

    assert_eq!(invoked, 0);
    assert!(seen.lock().is_empty());
    assert!(!d.caught(usr2));
}

#[test]
#[serial]
fn simultaneous_triggers_drain_in_ascending_numeric_order() {
    let d = dispatcher();
    let hup = kind("hup");
    let term = kind("term");
    assert!(hup.number() < term.number());

    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    for k in [term, hup] {
        let record = seen.clone();
        d.catch(
            k,
            Some(Box::new(move |name| {
                record.lock().push(name);
                Ok(())
            })),
            CatchOptions::default(),
        )
        .unwrap();
    }

    // Hold both, deliver both while held, then release so both kinds are
    // triggered before the drain starts.
    d.block(&[hup, term]).unwrap();
    d.raise(term).unwrap();
    d.raise(hup).unwrap();
    d.allow(&[hup, term]).unwrap();

    let invoked = d.poll_safe_point().unwrap();

    assert_eq!(invoked, 2);
    assert_eq!(*seen.lock(), vec!["hup", "term"]);

    d.ignore(&[hup, term]).unwrap();
}

#[test]
#[serial]
fn handler_scoped_block_defers_nested_delivery() {
    let d = dispatcher();
    let term = kind("term");
    let int = kind("int");
    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let record = seen.clone();
    d.catch(
        int,
        Some(Box::new(move |name| {
            record.lock().push(name);
            Ok(())
        })),
        CatchOptions::default(),
    )
    .unwrap();

    let record = seen.clone();
    d.catch(
        term,
        Some(Box::new(move |name| {
            record.lock().push(name);
            // Delivered while this callback runs: the kind's blocked set is
            // held at the OS level, so the nested raise stays pending.
            d.raise(kind("int")).unwrap();
            assert!(!d.caught(kind("int")));
            Ok(())
        })),
        CatchOptions::default().blocked(SignalSet::from_kinds([int])),
    )
    .unwrap();

    d.raise(term).unwrap();
    let invoked = d.poll_safe_point().unwrap();

    // The trampoline lifted the block after the term callback returned, the
    // deferred int delivery landed, and the same drain swept it up.
    assert_eq!(invoked, 2);
    assert_eq!(*seen.lock(), vec!["term", "int"]);

    d.ignore(&[term, int]).unwrap();
}

#[test]
#[serial]
fn callback_error_propagates_and_leaves_rest_for_next_poll() {
    let d = dispatcher();
    let usr1 = kind("usr1");
    let usr2 = kind("usr2");
    assert!(usr1.number() < usr2.number());

    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    d.catch(
        usr1,
        Some(Box::new(|_| Err(anyhow::anyhow!("deliberate failure")))),
        CatchOptions::default(),
    )
    .unwrap();

    let record = seen.clone();
    d.catch(
        usr2,
        Some(Box::new(move |name| {
            record.lock().push(name);
            Ok(())
        })),
        CatchOptions::default(),
    )
    .unwrap();

    d.block(&[usr1, usr2]).unwrap();
    d.raise(usr1).unwrap();
    d.raise(usr2).unwrap();
    d.allow(&[usr1, usr2]).unwrap();

    let err = d.poll_safe_point().unwrap_err();
    match err {
        SignalError::Handler { kind, .. } => assert_eq!(kind, "usr1"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(seen.lock().is_empty());

    // The failed drain left usr2 triggered; the next poll picks it up.
    let invoked = d.poll_safe_point().unwrap();
    assert_eq!(invoked, 1);
    assert_eq!(*seen.lock(), vec!["usr2"]);

    d.ignore(&[usr1, usr2]).unwrap();
}

#[test]
#[serial]
fn reregistration_inside_callback_wins() {
    let d = dispatcher();
    let usr1 = kind("usr1");
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let record = seen.clone();
    let replacement_record = seen.clone();
    d.catch(
        usr1,
        Some(Box::new(move |_| {
            record.lock().push("first".to_string());
            let record = replacement_record.clone();
            d.catch(
                kind("usr1"),
                Some(Box::new(move |_| {
                    record.lock().push("second".to_string());
                    Ok(())
                })),
                CatchOptions::default(),
            )?;
            Ok(())
        })),
        CatchOptions::default(),
    )
    .unwrap();

    d.raise(usr1).unwrap();
    d.poll_safe_point().unwrap();
    d.raise(usr1).unwrap();
    d.poll_safe_point().unwrap();

    assert_eq!(*seen.lock(), vec!["first".to_string(), "second".to_string()]);

    d.ignore(&[usr1]).unwrap();
}

#[test]
#[serial]
fn caught_any_consumes_the_observation_flag() {
    let d = dispatcher();
    let winch = kind("winch");
    d.catch(winch, None, CatchOptions::default()).unwrap();

    assert!(!d.caught_any());
    d.raise(winch).unwrap();
    assert!(d.caught_any());
    assert!(!d.caught_any());

    // The per-kind trigger is independent of the observation flag.
    assert!(d.caught(winch));

    d.ignore(&[winch]).unwrap();
}

#[test]
#[serial]
fn stats_reflect_dispatch_activity() {
    let d = dispatcher();
    let usr2 = kind("usr2");
    let before = d.stats();

    d.catch(
        usr2,
        Some(Box::new(|_| Ok(()))),
        CatchOptions::default(),
    )
    .unwrap();
    d.raise(usr2).unwrap();
    d.poll_safe_point().unwrap();
    d.ignore(&[usr2]).unwrap();

    let after = d.stats();
    assert!(after.callbacks_invoked >= before.callbacks_invoked + 1);
    assert!(after.drains >= before.drains + 1);
    assert_eq!(after.handlers_registered, before.handlers_registered);
}
