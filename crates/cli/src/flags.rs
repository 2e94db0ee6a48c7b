use clap::ValueEnum;
use psgc_graph::EdgeMode;

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum EdgeModeFlag {
    Dedupe,
    Append,
}

impl EdgeModeFlag {
    pub(crate) const fn as_domain(self) -> EdgeMode {
        match self {
            EdgeModeFlag::Dedupe => EdgeMode::Dedupe,
            EdgeModeFlag::Append => EdgeMode::Append,
        }
    }
}
