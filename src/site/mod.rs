//! Website analyzer: fetch a page, analyze it as an expert persona, then
//! answer follow-up questions about the analysis

mod analysis;
mod conversation;
mod fetch;

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::ai::ModelGateway;
use crate::command::is_exit;

use analysis::{ExpertRole, analyze, report};
use conversation::Conversation;

pub use fetch::{DocumentLoader, HttpLoader};

/// One console run of the analyzer
pub struct SiteSession<'a, G: ModelGateway + ?Sized, L: DocumentLoader + ?Sized, R: BufRead, W: Write>
{
    gateway: &'a G,
    loader: &'a L,
    input: R,
    output: W,
}

impl<'a, G: ModelGateway + ?Sized, L: DocumentLoader + ?Sized, R: BufRead, W: Write>
    SiteSession<'a, G, L, R, W>
{
    pub fn new(gateway: &'a G, loader: &'a L, input: R, output: W) -> Self {
        Self {
            gateway,
            loader,
            input,
            output,
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read operator input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn goodbye(&mut self) -> Result<()> {
        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let url = match self
            .read_line("Please enter the website URL you want to analyze (or type 'exit' to quit): ")?
        {
            Some(url) if !is_exit(&url) && !url.is_empty() => url,
            _ => return self.goodbye(),
        };

        writeln!(self.output, "\nPlease choose an expert role for the analysis:")?;
        for (i, role) in ExpertRole::ALL.iter().enumerate() {
            writeln!(self.output, "{}: {}", i + 1, role)?;
        }
        let choice = match self
            .read_line("Enter the number of your choice (1-3), or type 'exit' to quit: ")?
        {
            Some(choice) if !is_exit(&choice) => choice,
            _ => return self.goodbye(),
        };
        let Some(role) = ExpertRole::from_choice(&choice) else {
            writeln!(self.output, "Invalid choice. Exiting.")?;
            return Ok(());
        };

        writeln!(
            self.output,
            "\nActivating Lens AI as a {} to analyze {}...",
            role, url
        )?;

        let content = match self.loader.load(&url).await {
            Ok(content) => content,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Loading {} failed: {}", url, e);
                writeln!(
                    self.output,
                    "Sorry, I couldn't load or read that website. {}",
                    e
                )?;
                return Ok(());
            }
        };

        let analysis = match analyze(self.gateway, role, &content).await {
            Ok(analysis) => analysis,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Analysis of {} failed: {}", url, e);
                writeln!(self.output, "--> The analysis could not be completed: {}", e)?;
                return Ok(());
            }
        };

        report(&mut self.output, &analysis, &url, role)?;
        writeln!(
            self.output,
            "\nAnalysis complete. You can now ask follow-up questions about the strategy."
        )?;

        let mut conversation = Conversation::new(&url, role, &analysis)?;
        loop {
            let Some(question) = self.read_line("\nYour question (or type 'exit' to quit): ")?
            else {
                writeln!(self.output, "\nExiting conversation. Goodbye!")?;
                break;
            };
            if question.is_empty() {
                continue;
            }
            if is_exit(&question) {
                let feedback = self
                    .read_line(
                        "\nHow was your experience with the assistant? Your feedback is valuable!\n> ",
                    )?
                    .unwrap_or_default();
                if !feedback.is_empty() {
                    tracing::info!(url = %url, role = %role, "Analyzer feedback: {}", feedback);
                }
                writeln!(self.output, "Thank you for your feedback! Goodbye!")?;
                break;
            }

            writeln!(self.output, "\nLens AI is thinking...")?;
            match conversation.ask(self.gateway, &question).await {
                Ok(answer) => writeln!(self.output, "\nLens AI: {}", answer)?,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Follow-up question failed: {}", e);
                    writeln!(self.output, "--> {}", e)?;
                }
            }
        }
        Ok(())
    }
}
