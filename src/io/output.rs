use crate::core::{AnalysisResult, PriorityTier};
use colored::*;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Terminal,
}

pub trait OutputWriter {
    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_header(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Attack Path Analysis".bold())?;
        if let Some(generated) = &result.metadata.generated_at {
            writeln!(
                self.writer,
                "Generated: {}",
                generated.format("%Y-%m-%d %H:%M:%S UTC")
            )?;
        }
        if let Some(error) = &result.metadata.error {
            writeln!(self.writer, "{} {}", "note:".yellow().bold(), error)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_paths(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{} ({})",
            "Attack paths".bold(),
            result.attack_paths.len()
        )?;
        for path in &result.attack_paths {
            let route: Vec<&str> = path.steps.iter().map(|s| s.component.as_str()).collect();
            writeln!(
                self.writer,
                "  [{}] {} -> {}  impact={:?} likelihood={:?} steps={}",
                path.path_id,
                path.entry_point,
                path.target_asset,
                path.combined_impact,
                path.combined_likelihood,
                path.total_steps,
            )?;
            writeln!(self.writer, "      via {}", route.join(" -> "))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_priorities(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        if result.defense_priorities.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "{}", "Defense priorities".bold())?;
        for priority in &result.defense_priorities {
            let tier = match priority.priority_tier {
                PriorityTier::High => "HIGH".red().bold(),
                PriorityTier::Medium => "MEDIUM".yellow(),
            };
            writeln!(
                self.writer,
                "  {:>6}  {} (score {})",
                tier, priority.recommendation, priority.weighted_score
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_coverage(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        if let Some(coverage) = &result.threat_coverage {
            writeln!(
                self.writer,
                "Threat coverage: {}/{} ({}%)",
                coverage.covered_threats, coverage.total_threats, coverage.coverage_percentage
            )?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.write_header(result)?;
        self.write_paths(result)?;
        self.write_priorities(result)?;
        self.write_coverage(result)?;
        Ok(())
    }
}

pub fn create_writer<W: Write + 'static>(writer: W, format: OutputFormat) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}
