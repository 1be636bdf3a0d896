//! JSON-lines transport
//!
//! One message per line, tagged with a `type` field. The coordinator and
//! oracle exchanges share the stream: a grading request is the two-phase
//! `select` + `guess` pair, answered by a single `grade` verdict. Generic
//! over `BufRead`/`Write` so the framing is testable without a process
//! boundary.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use serde::{Deserialize, Serialize};

use crate::core::error::{DispatchError, Result};
use crate::core::types::VehicleId;
use crate::ipc::{Coordinator, Oracle, TurnNotice, TurnSnapshot, VehicleCommand};

/// Coordinator/oracle -> engine messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMsg {
    Turn(TurnNotice),
    Snapshot(TurnSnapshot),
    Grade { correct: bool },
}

/// Engine -> coordinator/oracle messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMsg {
    Ready,
    Commands { commands: Vec<VehicleCommand> },
    Select { vehicle: VehicleId },
    Guess { vehicle: VehicleId, guess: String },
}

pub struct StdioLink<R, W> {
    reader: R,
    writer: W,
}

impl StdioLink<BufReader<Stdin>, Stdout> {
    /// Link over the process's stdin/stdout
    pub fn over_stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> StdioLink<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn read_msg(&mut self) -> Result<InboundMsg> {
        let mut line = String::new();
        loop {
            line.clear();
            let bytes = self.reader.read_line(&mut line)?;
            if bytes == 0 {
                return Err(DispatchError::Transport("stream closed by peer".into()));
            }
            if !line.trim().is_empty() {
                return Ok(serde_json::from_str(line.trim())?);
            }
        }
    }

    fn write_msg(&mut self, msg: &OutboundMsg) -> Result<()> {
        let line = serde_json::to_string(msg)?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Coordinator for StdioLink<R, W> {
    fn wait_turn(&mut self) -> Result<TurnNotice> {
        match self.read_msg()? {
            InboundMsg::Turn(notice) => Ok(notice),
            other => Err(DispatchError::Transport(format!(
                "expected turn notice, got {other:?}"
            ))),
        }
    }

    fn snapshot(&mut self, _new_request_count: usize) -> Result<TurnSnapshot> {
        match self.read_msg()? {
            InboundMsg::Snapshot(snapshot) => Ok(snapshot),
            other => Err(DispatchError::Transport(format!(
                "expected snapshot, got {other:?}"
            ))),
        }
    }

    fn publish(&mut self, commands: &[VehicleCommand]) -> Result<()> {
        self.write_msg(&OutboundMsg::Commands {
            commands: commands.to_vec(),
        })
    }

    fn ready(&mut self) -> Result<()> {
        self.write_msg(&OutboundMsg::Ready)
    }
}

impl<R: BufRead, W: Write> Oracle for StdioLink<R, W> {
    fn grade(&mut self, vehicle: VehicleId, guess: &str) -> Result<bool> {
        self.write_msg(&OutboundMsg::Select { vehicle })?;
        self.write_msg(&OutboundMsg::Guess {
            vehicle,
            guess: guess.to_string(),
        })?;
        match self.read_msg()? {
            InboundMsg::Grade { correct } => Ok(correct),
            other => Err(DispatchError::Oracle(format!(
                "expected grading verdict, got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cell, Direction, PackageId};
    use std::io::Cursor;

    #[test]
    fn test_wait_turn_parses_notice() {
        let input = "\n{\"type\":\"turn\",\"turn\":3,\"new_request_count\":2}\n";
        let mut link = StdioLink::new(Cursor::new(input), Vec::new());
        let notice = link.wait_turn().unwrap();
        assert_eq!(notice.turn, 3);
        assert_eq!(notice.new_request_count, 2);
        assert!(!notice.error);
        assert!(!notice.finished);
    }

    #[test]
    fn test_unexpected_message_is_transport_error() {
        let input = "{\"type\":\"grade\",\"correct\":true}\n";
        let mut link = StdioLink::new(Cursor::new(input), Vec::new());
        assert!(link.wait_turn().is_err());
    }

    #[test]
    fn test_closed_stream_is_transport_error() {
        let mut link = StdioLink::new(Cursor::new(""), Vec::new());
        assert!(link.wait_turn().is_err());
    }

    #[test]
    fn test_publish_writes_one_line() {
        let mut link = StdioLink::new(Cursor::new(""), Vec::new());
        link.publish(&[VehicleCommand {
            direction: Direction::Right,
            pickup: Some(PackageId(4)),
            dropoff: None,
            auth: Some("ud".into()),
        }])
        .unwrap();
        let out = String::from_utf8(link.writer.clone()).unwrap();
        assert_eq!(out.lines().count(), 1);
        let parsed: OutboundMsg = serde_json::from_str(out.trim()).unwrap();
        match parsed {
            OutboundMsg::Commands { commands } => {
                assert_eq!(commands[0].direction, Direction::Right);
                assert_eq!(commands[0].auth.as_deref(), Some("ud"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_grade_round_trip() {
        let input = "{\"type\":\"grade\",\"correct\":true}\n";
        let mut link = StdioLink::new(Cursor::new(input), Vec::new());
        assert!(link.grade(VehicleId(1), "u").unwrap());

        let out = String::from_utf8(link.writer.clone()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(matches!(
            serde_json::from_str(lines[0]).unwrap(),
            OutboundMsg::Select { vehicle: VehicleId(1) }
        ));
        assert!(matches!(
            serde_json::from_str(lines[1]).unwrap(),
            OutboundMsg::Guess { .. }
        ));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = TurnSnapshot {
            requests: vec![],
            vehicles: vec![crate::ipc::VehicleReading {
                position: Cell::new(2, 3),
                onboard_count: 1,
            }],
            packages: vec![crate::ipc::PackageReading {
                id: PackageId(0),
                location: None,
            }],
        };
        let line = serde_json::to_string(&InboundMsg::Snapshot(snapshot)).unwrap();
        let mut link = StdioLink::new(Cursor::new(format!("{line}\n")), Vec::new());
        let parsed = link.snapshot(0).unwrap();
        assert_eq!(parsed.vehicles[0].position, Cell::new(2, 3));
        assert!(parsed.packages[0].location.is_none());
    }
}
