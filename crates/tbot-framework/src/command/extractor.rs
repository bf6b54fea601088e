use std::sync::Arc;

use clap::Parser;

use super::split::shell_split;
use crate::context::Context;
use crate::error::{ExtractError, ExtractResult};
use crate::extractor::FromContext;

/// Command arguments parsed with clap.
///
/// The route name (without the leading `/`) is used as clap's binary name,
/// so usage lines read `Usage: remind <MINUTES> ...`.
#[derive(Debug, Clone)]
pub struct CommandArgs<T: Parser>(pub T);

impl<T: Parser> CommandArgs<T> {
    /// Unwraps the parsed value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Parser> std::ops::Deref for CommandArgs<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Parser> std::ops::DerefMut for CommandArgs<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Parser> FromContext for CommandArgs<T> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        let name = ctx.route().unwrap_or(ctx.command()).trim_start_matches('/');
        let args = std::iter::once(name.to_string()).chain(shell_split(ctx.args()));
        T::try_parse_from(args)
            .map(CommandArgs)
            .map_err(|err| ExtractError::InvalidArgs(err.render().to_string().trim_end().to_string()))
    }
}
