//! End-to-end scenarios spanning `subtake-core` and `subtake-common`.

#[cfg(test)]
mod pipeline;
#[cfg(test)]
mod support;
