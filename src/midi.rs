use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use midir::{MidiOutput, MidiOutputConnection};

use crate::sink::{NoteError, NoteEvent, NoteSink, Timestamp};

const CLIENT_NAME: &str = "piano-keys";
const SOFT_SYNTH_HINTS: [&str; 5] = ["fluid", "timidity", "synth", "microsoft", "gm"];

pub struct MidiOutSink {
    conn: MidiOutputConnection,
    channel: u8,
}

impl MidiOutSink {
    /// Connects to the first port whose name contains `filter`, or to the
    /// most synth-like port when no filter is given.
    pub fn open(filter: Option<&str>, channel: u8) -> Result<Self> {
        let output = MidiOutput::new(CLIENT_NAME).context("could not initialise MIDI output")?;
        let ports = output.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| {
                output
                    .port_name(port)
                    .unwrap_or_else(|_| "unknown".to_string())
            })
            .collect();

        let index = select_port(&names, filter).ok_or_else(|| match filter {
            Some(filter) => anyhow!("no MIDI output port matches {filter:?} (found {names:?})"),
            None => anyhow!("no MIDI output ports available"),
        })?;
        let port_name = &names[index];
        let conn = output
            .connect(&ports[index], CLIENT_NAME)
            .map_err(|err| anyhow!("could not connect to MIDI port {port_name}: {err}"))?;
        info!("sending notes to MIDI port {port_name}");

        Ok(Self { conn, channel })
    }
}

impl NoteSink for MidiOutSink {
    fn send(&mut self, event: NoteEvent) -> Result<(), NoteError> {
        let message = event.encode(self.channel)?;
        // midir has no scheduled send.
        if let Timestamp::At(micros) = event.timestamp {
            debug!("sending note scheduled for {micros}us now");
        }
        self.conn
            .send(&message)
            .map_err(|err| NoteError::Backend(err.to_string()))
    }
}

pub fn select_port(names: &[String], filter: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    match filter {
        Some(filter) => {
            let filter = filter.to_lowercase();
            names
                .iter()
                .position(|name| name.to_lowercase().contains(&filter))
        }
        None => {
            let preferred = names.iter().position(|name| {
                let name = name.to_lowercase();
                SOFT_SYNTH_HINTS.iter().any(|hint| name.contains(hint))
            });
            Some(preferred.unwrap_or(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let ports = names(&["Midi Through", "IAC Bus 1", "USB Keys"]);
        assert_eq!(select_port(&ports, Some("iac")), Some(1));
        assert_eq!(select_port(&ports, Some("nothing")), None);
    }

    #[test]
    fn prefers_software_synth_without_filter() {
        let ports = names(&["Midi Through", "FLUID Synth (1234)"]);
        assert_eq!(select_port(&ports, None), Some(1));
        let plain = names(&["Midi Through", "USB Keys"]);
        assert_eq!(select_port(&plain, None), Some(0));
    }

    #[test]
    fn no_ports_no_selection() {
        assert_eq!(select_port(&[], None), None);
    }
}
