//! Functions implemented in Rust and available to every program.

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::env::Environment;
use crate::eval::RuntimeErrorKind;
use crate::value::{Callable, NativeFunction, Value};

const NATIVES: [NativeFunction; 3] = [
    NativeFunction {
        name: "clock",
        arity: 0,
        body: clock,
    },
    NativeFunction {
        name: "sleep",
        arity: 1,
        body: sleep,
    },
    NativeFunction {
        name: "sqrt",
        arity: 1,
        body: sqrt,
    },
];

/// Bind every native function in the current frame of `env`.
pub fn install(env: &mut Environment) {
    for native in NATIVES {
        env.define(native.name, Value::Callable(Callable::Native(native)));
    }
}

/// Seconds elapsed since the Unix epoch.
fn clock(_args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| RuntimeErrorKind::Native(format!("'clock' failed: {}", e)))?;
    Ok(Value::Number(now.as_secs_f64()))
}

/// Block for the given number of seconds and return it.
fn sleep(args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    let bad_arg = || {
        RuntimeErrorKind::Native("'sleep' expected argument to be a non-negative number.".into())
    };
    match args {
        [Value::Number(secs)] => {
            let duration = Duration::try_from_secs_f64(*secs).map_err(|_| bad_arg())?;
            thread::sleep(duration);
            Ok(Value::Number(*secs))
        }
        _ => Err(bad_arg()),
    }
}

fn sqrt(args: &[Value]) -> Result<Value, RuntimeErrorKind> {
    match args {
        [Value::Number(n)] => Ok(Value::Number(n.sqrt())),
        _ => Err(RuntimeErrorKind::Native(
            "'sqrt' expected argument to be a number.".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_after_epoch() -> Result<(), RuntimeErrorKind> {
        match clock(&[])? {
            Value::Number(n) => assert!(n > 0.0),
            v => panic!("unexpected output: {:?}", v),
        }
        Ok(())
    }

    #[test]
    fn sleep_returns_its_argument() -> Result<(), RuntimeErrorKind> {
        assert_eq!(sleep(&[Value::Number(0.0)])?, Value::Number(0.0));
        Ok(())
    }

    #[test]
    fn sleep_rejects_bad_durations() {
        assert!(matches!(
            sleep(&[Value::Number(-1.0)]),
            Err(RuntimeErrorKind::Native(_))
        ));
        assert!(matches!(
            sleep(&[Value::Number(f64::NAN)]),
            Err(RuntimeErrorKind::Native(_))
        ));
        assert!(matches!(
            sleep(&[Value::from("1")]),
            Err(RuntimeErrorKind::Native(_))
        ));
    }

    #[test]
    fn sqrt_of_number() -> Result<(), RuntimeErrorKind> {
        assert_eq!(sqrt(&[Value::Number(4.0)])?, Value::Number(2.0));
        Ok(())
    }

    #[test]
    fn natives_are_installed() {
        let mut env = Environment::new();
        install(&mut env);
        for name in ["clock", "sleep", "sqrt"] {
            assert!(matches!(
                env.lookup(name),
                Some(Value::Callable(Callable::Native(_)))
            ));
        }
    }
}
