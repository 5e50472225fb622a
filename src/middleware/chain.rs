//! Middleware chain.

use super::{Handler, Middleware};

/// Wraps `terminal` in `middlewares`, first element outermost.
///
/// `chain(h, [a, b, c])` is `a(b(c(h)))`: requests pass through `a` first and
/// responses leave through `a` last.
pub fn chain<I>(terminal: Handler, middlewares: I) -> Handler
where
    I: IntoIterator<Item = Middleware>,
    I::IntoIter: DoubleEndedIterator,
{
    middlewares
        .into_iter()
        .rev()
        .fold(terminal, |handler, middleware| middleware(handler))
}
