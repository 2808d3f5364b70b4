//! Template commands.

use std::io::Write;

use serde::Serialize;

use crate::cli::TemplatesCommands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat, TableDisplay};
use crate::workspace::Workspace;

/// Handler for `templates` subcommands.
pub struct TemplatesCommand<'a> {
    workspace: &'a Workspace,
}

impl<'a> TemplatesCommand<'a> {
    /// Creates a new templates command handler.
    #[must_use]
    pub const fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Executes a templates subcommand.
    ///
    /// # Errors
    ///
    /// Returns error on an invalid id or I/O failure.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &TemplatesCommands,
    ) -> Result<(), CliError> {
        let templates = self.workspace.templates();
        match command {
            TemplatesCommands::Add { id, body } => {
                templates.add(id, body)?;
                format.write(out, &Message::success(format!("Saved template {id}")))
            }
            TemplatesCommands::Show { id } => match templates.show(id)? {
                Some(body) => format.write(
                    out,
                    &TemplateBody {
                        id: id.clone(),
                        body,
                    },
                ),
                None => Ok(()),
            },
            TemplatesCommands::List => format.write(
                out,
                &TemplateList {
                    ids: templates.list()?,
                },
            ),
        }
    }
}

/// A template's text.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateBody {
    /// Template ID.
    pub id: String,
    /// Template text.
    pub body: String,
}

impl TableDisplay for TemplateBody {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.body)?;
        Ok(())
    }
}

/// Known template IDs.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TemplateList {
    /// Sorted IDs.
    pub ids: Vec<String>,
}

impl TableDisplay for TemplateList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for id in &self.ids {
            writeln!(writer, "{id}")?;
        }
        Ok(())
    }
}
