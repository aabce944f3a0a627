use clap::ValueEnum;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum AlgorithmFlag {
    #[value(alias = "knn")]
    Exact,
    #[value(alias = "ann")]
    Approximate,
}

impl AlgorithmFlag {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            AlgorithmFlag::Exact => "exact",
            AlgorithmFlag::Approximate => "approximate",
        }
    }
}
