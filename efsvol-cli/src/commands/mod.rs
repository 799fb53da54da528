pub mod create;
pub mod info;
pub mod list;
pub mod mount;
pub mod open_perms;
pub mod plugin;
pub mod rm;

/// Turn a protocol `Err` string into a command result.
pub(crate) fn check(err: String) -> anyhow::Result<()> {
    if err.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(err))
    }
}

/// Run `op` on every target, printing each one that succeeds.
///
/// Failures are reported as they happen and summarized at the end.
pub(crate) async fn for_each_target<F, Fut>(
    targets: Vec<String>,
    verb: &str,
    mut op: F,
) -> anyhow::Result<()>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<String>>,
{
    let mut errors = Vec::new();
    let mut success_count = 0;

    for target in targets {
        match op(target.clone()).await {
            Ok(line) => {
                println!("{}", line);
                success_count += 1;
            }
            Err(e) => {
                eprintln!("Error: failed to {} volume '{}': {}", verb, target, e);
                errors.push(format!("{}: {}", target, e));
            }
        }
    }

    if !errors.is_empty() {
        let error_summary = if success_count > 0 {
            format!(
                "Failed to {} {} of {} volume(s)",
                verb,
                errors.len(),
                errors.len() + success_count
            )
        } else {
            format!("Failed to {} all {} volume(s)", verb, errors.len())
        };

        anyhow::bail!("{}\nErrors:\n  {}", error_summary, errors.join("\n  "));
    }
    Ok(())
}
