use std::collections::BTreeMap;

use clap::Args;
use efsvol::VolumeDriver;
use efsvol::driver::{CreateOpts, CreateRequest};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name of the volume
    pub name: String,

    /// Address of the NFS server exporting the volume
    #[arg(long)]
    pub ip: String,

    /// Zone-local mount source, as ZONE=SOURCE (repeatable)
    #[arg(long = "az-map", value_name = "ZONE=SOURCE", value_parser = parse_az_entry)]
    pub az_map: Vec<(String, String)>,
}

fn parse_az_entry(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((zone, source)) if !zone.is_empty() && !source.is_empty() => {
            Ok((zone.to_string(), source.to_string()))
        }
        _ => Err(format!("expected ZONE=SOURCE, got '{}'", s)),
    }
}

pub async fn execute(args: CreateArgs, driver: &VolumeDriver) -> anyhow::Result<()> {
    let request = CreateRequest {
        name: args.name.clone(),
        opts: CreateOpts {
            ip: Some(args.ip),
            az_map: args.az_map.into_iter().collect::<BTreeMap<_, _>>(),
        },
    };

    super::check(driver.create(request).await.err)?;
    println!("{}", args.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_az_entry() {
        assert_eq!(
            parse_az_entry("us-east-1a=10.0.1.1:/").unwrap(),
            ("us-east-1a".to_string(), "10.0.1.1:/".to_string())
        );
        assert!(parse_az_entry("us-east-1a").is_err());
        assert!(parse_az_entry("=10.0.1.1").is_err());
        assert!(parse_az_entry("us-east-1a=").is_err());
    }
}
