use crate::Stage;
use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
/// A verifier for Metamath databases
pub struct Opt {
    /// Verify only proofs starting from the theorem with the given label
    #[clap(long, short = 'b')]
    pub begin_label: Option<String>,

    /// Stop reading at the statement with the given label
    ///
    /// The statement with the given label and all statements after it
    /// are ignored, as if the database ended before it.
    #[clap(long, short = 's')]
    pub stop_label: Option<String>,

    /// Perform only operations until (excluding) the given stage.
    ///
    /// Possible values are: verify.
    #[clap(long)]
    pub omit: Option<Stage>,

    /// Read given number of statements in advance (∞ if argument omitted)
    ///
    /// If this option is used, statements are read and proofs verified simultaneously.
    /// If this option is given with a number n, then
    /// maximally n proofs wait for verification.
    /// If this option is given without an extra argument, then
    /// the number of waiting proofs is unbounded.
    ///
    /// Note that unbounded reading can lead to high memory usage!
    #[clap(long, short = 'c')]
    pub channel_capacity: Option<Option<usize>>,

    /// Verify concurrently
    ///
    /// If this option is used, proofs are verified in parallel.
    /// If this option is given with a number n, then
    /// maximally n proofs are concurrently verified.
    /// If this option is given without an extra argument, then
    /// the number of concurrently verified proofs is
    /// determined automatically from the number of CPUs.
    ///
    /// This option enables reading in advance ("-c"),
    /// by default with an unbounded capacity.
    #[clap(long, short = 'j')]
    pub jobs: Option<Option<usize>>,

    /// After verification, answer proof search requests on standard input
    ///
    /// Every line of input is a JSON request, and
    /// every request is answered by a line of JSON on standard output.
    #[clap(long)]
    pub serve: bool,

    /// Database to process
    #[clap(name = "FILE")]
    pub file: PathBuf,
}

impl Opt {
    pub fn omits(&self, stage: Stage) -> bool {
        self.omit == Some(stage)
    }

    pub fn config(&self) -> mmko::Config {
        mmko::Config {
            begin: self.begin_label.clone(),
            stop: self.stop_label.clone(),
        }
    }
}

#[test]
fn args() {
    let opt = Opt::parse_from(["mmcheck", "-j", "-b", "th1", "set.mm"]);
    assert_eq!(opt.jobs, Some(None));
    assert_eq!(opt.begin_label.as_deref(), Some("th1"));
    assert_eq!(opt.file, PathBuf::from("set.mm"));
    assert!(!opt.omits(Stage::Verify));

    let opt = Opt::parse_from(["mmcheck", "--omit", "verify", "-c", "8", "set.mm"]);
    assert_eq!(opt.channel_capacity, Some(Some(8)));
    assert!(opt.omits(Stage::Verify));
}
