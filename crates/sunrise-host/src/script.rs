//! Touch driver replaying a text script.
//!
//! One command per line, `#` starts a comment:
//!
//! | Command     | Effect                                              |
//! |-------------|-----------------------------------------------------|
//! | `tap X Y`   | finger down at landscape `(X, Y)` for one poll, then up |
//! | `hold X Y N`| finger down at `(X, Y)` for `N` polls, then up       |
//! | `wait N`    | `N` polls with no contact                           |
//!
//! Once the script runs out the panel reports no contact forever.

use std::collections::VecDeque;

use thiserror_no_std::Error;

use sunrise_core::drivers::{DriverError, TouchDriver};
use sunrise_core::touch::{LANDSCAPE_HEIGHT, LANDSCAPE_WIDTH, RawTouchSample};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: expected {expected}")]
    BadArguments { line: usize, expected: &'static str },
    #[error("line {line}: ({x}, {y}) is off screen")]
    OffScreen { line: usize, x: u16, y: u16 },
}

#[derive(Debug, Default)]
pub struct ScriptedTouch {
    polls: VecDeque<Option<RawTouchSample>>,
}

impl ScriptedTouch {
    pub fn parse(script: &str) -> Result<Self, ScriptError> {
        let mut polls = VecDeque::new();

        for (index, raw_line) in script.lines().enumerate() {
            let line = index + 1;
            let content = raw_line.split('#').next().unwrap_or_default().trim();
            let mut words = content.split_whitespace();
            let Some(command) = words.next() else {
                continue;
            };
            let args: Vec<&str> = words.collect();

            match command {
                "tap" | "hold" => {
                    let expected = if command == "tap" { 2 } else { 3 };
                    if args.len() != expected {
                        return Err(ScriptError::BadArguments {
                            line,
                            expected: if command == "tap" { "tap X Y" } else { "hold X Y N" },
                        });
                    }
                    let numbers = parse_numbers(&args, line)?;
                    let sample = to_sensor(numbers[0], numbers[1], line)?;
                    let repeats = numbers.get(2).copied().unwrap_or(1).max(1);
                    for _ in 0..repeats {
                        polls.push_back(Some(sample));
                    }
                    polls.push_back(None);
                }
                "wait" => {
                    let [count] = args[..] else {
                        return Err(ScriptError::BadArguments {
                            line,
                            expected: "wait N",
                        });
                    };
                    let count = parse_numbers(&[count], line)?[0];
                    polls.extend((0..count).map(|_| None));
                }
                other => {
                    return Err(ScriptError::UnknownCommand {
                        line,
                        command: other.to_string(),
                    });
                }
            }
        }

        Ok(Self { polls })
    }

    pub fn remaining(&self) -> usize {
        self.polls.len()
    }
}

fn parse_numbers(args: &[&str], line: usize) -> Result<Vec<u16>, ScriptError> {
    args.iter()
        .map(|arg| {
            arg.parse::<u16>().map_err(|_| ScriptError::BadArguments {
                line,
                expected: "non-negative integers",
            })
        })
        .collect()
}

/// Inverse of the mapper's rotation: landscape `(x, y)` to a sensor sample.
fn to_sensor(x: u16, y: u16, line: usize) -> Result<RawTouchSample, ScriptError> {
    if x >= LANDSCAPE_WIDTH || y >= LANDSCAPE_HEIGHT {
        return Err(ScriptError::OffScreen { line, x, y });
    }
    Ok(RawTouchSample::new(y, LANDSCAPE_WIDTH - 1 - x))
}

impl TouchDriver for ScriptedTouch {
    fn poll(&mut self) -> Result<Option<RawTouchSample>, DriverError> {
        Ok(self.polls.pop_front().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunrise_core::touch::{LogicalPoint, TouchMapper};

    #[test]
    fn test_tap_round_trips_through_mapper() {
        let mut touch = ScriptedTouch::parse("tap 200 10\n").unwrap();
        let raw = touch.poll().unwrap().unwrap();
        assert_eq!(TouchMapper::to_logical(raw), Some(LogicalPoint::new(200, 10)));
        assert_eq!(touch.poll().unwrap(), None);
        assert_eq!(touch.remaining(), 0);
    }

    #[test]
    fn test_comments_wait_and_hold() {
        let script = "# open settings\nwait 2\nhold 150 10 3 # SET\n\n";
        let touch = ScriptedTouch::parse(script).unwrap();
        assert_eq!(touch.remaining(), 2 + 3 + 1);
    }

    #[test]
    fn test_errors_name_the_line() {
        assert_eq!(
            ScriptedTouch::parse("wait 1\nswipe 1 2").unwrap_err(),
            ScriptError::UnknownCommand {
                line: 2,
                command: "swipe".to_string()
            }
        );
        assert!(matches!(
            ScriptedTouch::parse("tap 250 10"),
            Err(ScriptError::OffScreen { line: 1, .. })
        ));
        assert!(matches!(
            ScriptedTouch::parse("tap 1"),
            Err(ScriptError::BadArguments { line: 1, .. })
        ));
    }
}
