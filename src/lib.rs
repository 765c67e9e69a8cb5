mod context;
mod error;
mod formula;
mod game_sdds;
mod ltlf_parser;
mod ltlf_writer;
mod nnf;
mod partition;
mod simplify;
mod synthesis;
mod visitor;
mod xnf;

pub use context::Context;
pub use error::SynthesisError;
pub use formula::{AtomId, Formula, LtlfNode};
pub use game_sdds::{GameSdds, VarAllocation};
pub use ltlf_parser::parse_ltlf;
pub use ltlf_writer::write_ltlf;
pub use nnf::ToNnf;
pub use partition::Partition;
pub use simplify::Simplify;
pub use synthesis::synthesize;
pub use visitor::{accept, Visitor};
pub use xnf::Xnf;
