//! Version-aware access to a reporter's output.

use utplsql_session::{DatabaseSession, FrameworkVersion, OutputChannel, Reporter};

use super::Sink;
use crate::error::SinkError;

/// Reads one reporter's output through the channel its framework supports.
#[derive(Debug, Clone, Copy)]
pub struct OutputBuffer<'a> {
    reporter: &'a Reporter,
    channel: OutputChannel,
}

impl<'a> OutputBuffer<'a> {
    /// Frameworks from 3.1.0 stream through the reporter cursor; older ones
    /// expose the legacy output buffer.
    pub fn compatible(version: &FrameworkVersion, reporter: &'a Reporter) -> Self {
        let channel = if version.is_at_least(&FrameworkVersion::V3_1_0) {
            OutputChannel::ReporterCursor
        } else {
            OutputChannel::LegacyBuffer
        };
        Self { reporter, channel }
    }

    pub fn channel(&self) -> OutputChannel {
        self.channel
    }

    /// Fetch everything the reporter has produced once and write it to every
    /// sink. Returns the number of lines.
    ///
    /// A failing sink does not stop the others; the first failure is returned
    /// after all sinks have been written.
    pub async fn print_available(
        &self,
        session: &dyn DatabaseSession,
        sinks: &mut [Sink],
    ) -> Result<usize, SinkError> {
        let lines = session.fetch_output(self.reporter, self.channel).await?;

        let mut first_error = None;
        for sink in sinks.iter_mut() {
            let written = lines
                .iter()
                .try_for_each(|line| sink.write_line(line))
                .and_then(|_| sink.flush());
            if let Err(e) = written {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(lines.len()),
        }
    }
}
