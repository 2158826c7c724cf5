//! `terraform workspace` subcommands.

use crate::error::TerraformResult;
use crate::parser;
use crate::result::{WorkspaceListResult, WorkspaceResult};
use crate::terraform::Terraform;

/// Workspace operations, obtained from [`Terraform::workspace`].
#[derive(Debug, Clone, Copy)]
pub struct WorkspaceCommands<'a> {
    pub(crate) terraform: &'a Terraform,
}

impl WorkspaceCommands<'_> {
    /// Create a workspace and switch to it.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(&self, name: &str) -> TerraformResult<WorkspaceResult> {
        let prepared = self.terraform.builder()?.workspace_new(name)?;
        self.terraform.run_parsed(&prepared, None, parser::workspace::parse_change)
    }

    pub fn select(&self, name: &str) -> TerraformResult<WorkspaceResult> {
        let prepared = self.terraform.builder()?.workspace_select(name, false)?;
        self.terraform.run_parsed(&prepared, None, parser::workspace::parse_change)
    }

    /// Select a workspace, creating it first if needed (Terraform 1.4+).
    /// The result's action tells which of the two happened.
    pub fn select_or_create(&self, name: &str) -> TerraformResult<WorkspaceResult> {
        let prepared = self.terraform.builder()?.workspace_select(name, true)?;
        self.terraform.run_parsed(&prepared, None, parser::workspace::parse_change)
    }

    pub fn list(&self) -> TerraformResult<WorkspaceListResult> {
        let prepared = self.terraform.builder()?.workspace_list()?;
        self.terraform.run_parsed(&prepared, None, parser::workspace::parse_list)
    }

    /// Name of the current workspace.
    pub fn show(&self) -> TerraformResult<WorkspaceResult> {
        let prepared = self.terraform.builder()?.workspace_show()?;
        self.terraform.run_parsed(&prepared, None, parser::workspace::parse_show)
    }

    /// Delete a workspace. `force` deletes it even if it still tracks resources.
    pub fn delete(&self, name: &str, force: bool) -> TerraformResult<WorkspaceResult> {
        let prepared = self.terraform.builder()?.workspace_delete(name, force)?;
        self.terraform.run_parsed(&prepared, None, parser::workspace::parse_change)
    }
}
