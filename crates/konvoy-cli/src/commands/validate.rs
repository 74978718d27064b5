//! Validate command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use konvoy_common::crd::{ProxyTemplate, SourceType};
use konvoy_xds::generator::{decode_raw_resources, ProfileRegistry};
use konvoy_xds::GenerateError;

use crate::input::read_manifests;
use crate::Result;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// ProxyTemplate manifests (one or more YAML documents)
    #[arg(long, short = 't')]
    pub template: PathBuf,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let templates: Vec<ProxyTemplate> = read_manifests(&args.template, "ProxyTemplate")?;
    let errors = check_templates(&templates, &ProfileRegistry::builtin());

    for template in &templates {
        println!("  {} checked", template.qualified_name());
    }
    println!();

    if errors.is_empty() {
        info!(templates = templates.len(), "all templates valid");
        println!("All validations passed");
        Ok(())
    } else {
        println!("Validation errors:");
        for error in &errors {
            println!("  - {}", error);
        }
        Err(crate::Error::validation(format!(
            "{} validation errors",
            errors.len()
        )))
    }
}

/// Check every source of every template, collecting all failures.
///
/// Profile sources must name a registered profile; raw sources must decode.
pub fn check_templates(templates: &[ProxyTemplate], profiles: &ProfileRegistry) -> Vec<String> {
    let mut errors = Vec::new();
    for template in templates {
        for (index, source) in template.spec.conf.sources.iter().enumerate() {
            let result = match source.source_type() {
                Some(SourceType::Profile(profile)) => profiles.get(&profile.name).map(|_| ()),
                Some(SourceType::Raw(raw)) => decode_raw_resources(&raw.resources).map(|_| ()),
                None => Err(GenerateError::InvalidSource),
            };
            if let Err(e) = result {
                let err = GenerateError::Source {
                    index,
                    name: source.name.clone(),
                    source: Box::new(e),
                };
                errors.push(format!("{}: {}", template.qualified_name(), err));
            }
        }
    }
    errors
}
