pub(crate) mod mail;
pub(crate) mod relay;
