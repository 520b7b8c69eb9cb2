//! A verifier for Metamath databases.

#[macro_use]
extern crate log;

mod check;
mod error;
mod opt;
mod serve;
mod stage;

use clap::Parser;
use error::Error;
use opt::Opt;
use stage::Stage;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env("LOG").init();

    let opt = Opt::parse();

    let db = check::run(&opt)?;
    info!("read {} labelled statements", db.labels().len());

    if opt.serve {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        serve::serve(&db, stdin.lock(), stdout.lock())?
    }
    Ok(())
}
