//! Profiles command

use konvoy_xds::generator::ProfileRegistry;

use crate::Result;

pub fn run() -> Result<()> {
    for name in ProfileRegistry::builtin().names() {
        println!("{}", name);
    }
    Ok(())
}
