use nanofiche::io::ext_repr::{ExtInstance, ExtSolution};
use serde::{Deserialize, Serialize};

use crate::config::TilerConfig;

#[derive(Serialize, Deserialize, Clone)]
pub struct PackOutput {
    #[serde(flatten)]
    pub instance: ExtInstance,
    pub solution: ExtSolution,
    pub config: TilerConfig,
}
