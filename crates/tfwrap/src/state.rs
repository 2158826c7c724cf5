//! `terraform state` subcommands.

use crate::error::TerraformResult;
use crate::options::{
    StateListOptions, StateMvOptions, StateReplaceProviderOptions, StateRmOptions, StateShowOptions,
};
use crate::parser;
use crate::result::{
    StateListResult, StateMvResult, StatePullResult, StateReplaceProviderResult, StateRmResult,
    StateShowResult,
};
use crate::terraform::Terraform;

/// State operations, obtained from [`Terraform::state`].
#[derive(Debug, Clone, Copy)]
pub struct StateCommands<'a> {
    pub(crate) terraform: &'a Terraform,
}

impl StateCommands<'_> {
    /// Resource addresses in state, optionally filtered.
    pub fn list(&self, options: &StateListOptions) -> TerraformResult<StateListResult> {
        let prepared = self.terraform.builder()?.state_list(options)?;
        self.terraform.run_parsed(&prepared, None, parser::state::parse_list)
    }

    pub fn show(&self, options: &StateShowOptions) -> TerraformResult<StateShowResult> {
        let prepared = self.terraform.builder()?.state_show(options)?;
        self.terraform.run_parsed(&prepared, None, parser::state::parse_show)
    }

    /// Forget resources without destroying them.
    pub fn rm(&self, options: &StateRmOptions) -> TerraformResult<StateRmResult> {
        let prepared = self.terraform.builder()?.state_rm(options)?;
        self.terraform.run_parsed(&prepared, None, parser::state::parse_rm)
    }

    pub fn mv(&self, options: &StateMvOptions) -> TerraformResult<StateMvResult> {
        let prepared = self.terraform.builder()?.state_mv(options)?;
        self.terraform.run_parsed(&prepared, None, parser::state::parse_mv)
    }

    /// The current state document. Empty when nothing has been applied yet.
    pub fn pull(&self) -> TerraformResult<StatePullResult> {
        let prepared = self.terraform.builder()?.state_pull()?;
        self.terraform.run_parsed(&prepared, None, parser::state::parse_pull)
    }

    /// Point resources at a different provider source, e.g. after a fork
    /// or a registry move.
    pub fn replace_provider(
        &self,
        options: &StateReplaceProviderOptions,
    ) -> TerraformResult<StateReplaceProviderResult> {
        let prepared = self.terraform.builder()?.state_replace_provider(options)?;
        self.terraform.run_parsed(&prepared, None, parser::state::parse_replace_provider)
    }
}
