use anyhow::Result;
use dialoguer::Confirm;
use detour_core::{ConfigStore, Rule, RuleEdit, RuleError, RuleId};

const SHORT_ID_LENGTH: usize = 8;

pub fn list(store: &ConfigStore) -> Result<()> {
    let rules = store.rules();

    if rules.is_empty() {
        println!("No redirect rules yet. Add one with 'detour rules add <source> <target>'.");
        return Ok(());
    }

    let issues = store.rule_issues();

    println!();
    println!(
        "{:8}  {:3}  {:28} {:36} {:>9}",
        "ID", "ON", "SOURCE", "TARGET", "REDIRECTS"
    );

    for rule in rules {
        println!(
            "{:8}  {:3}  {:28} {:36} {:>9}",
            short_id(&rule.id),
            if rule.enabled { "yes" } else { "no" },
            rule.source_hostname,
            rule.target_url,
            store.metrics().count_for(&rule.id)
        );

        if let Some((_, error)) = issues.iter().find(|(id, _)| *id == rule.id) {
            println!("└── {}", error);
        }
    }
    println!();

    Ok(())
}

pub async fn add(store: &mut ConfigStore, source: &str, target: &str) -> Result<()> {
    let rule = store.add_rule(source, target).await?;

    println!(
        "Rule {} added: {} -> {}",
        short_id(&rule.id),
        rule.source_hostname,
        rule.target_url
    );
    Ok(())
}

pub async fn edit(
    store: &mut ConfigStore,
    id_prefix: &str,
    source: Option<String>,
    target: Option<String>,
) -> Result<()> {
    if source.is_none() && target.is_none() {
        anyhow::bail!("nothing to change. Pass --source and/or --target.");
    }

    let id = resolve_id(store.rules(), id_prefix)?;
    let rule = store
        .update_rule(
            &id,
            RuleEdit {
                source_hostname: source,
                target_url: target,
            },
        )
        .await?;

    println!(
        "Rule {} updated: {} -> {}",
        short_id(&rule.id),
        rule.source_hostname,
        rule.target_url
    );
    Ok(())
}

pub async fn set_enabled(store: &mut ConfigStore, id_prefix: &str, enabled: bool) -> Result<()> {
    let id = resolve_id(store.rules(), id_prefix)?;
    let rule = store.set_rule_enabled(&id, enabled).await?;

    let state = if rule.enabled { "enabled" } else { "disabled" };
    println!("Rule {} {}.", short_id(&rule.id), state);

    if let Some((_, error)) = store.rule_issues().into_iter().find(|(id, _)| *id == rule.id) {
        warn_invalid(&error);
    }
    Ok(())
}

pub async fn delete(store: &mut ConfigStore, id_prefix: &str, skip_confirmation: bool) -> Result<()> {
    let id = resolve_id(store.rules(), id_prefix)?;

    if !skip_confirmation {
        let prompt = match store.rule(&id) {
            Some(rule) => format!("Delete rule {} -> {}?", rule.source_hostname, rule.target_url),
            None => format!("Delete rule {}?", short_id(&id)),
        };

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store.delete_rule(&id).await?;
    println!("Rule {} deleted.", short_id(&removed.id));
    Ok(())
}

/// Finds the rule whose id equals or uniquely starts with `prefix`.
fn resolve_id(rules: &[Rule], prefix: &str) -> Result<RuleId> {
    if let Some(rule) = rules.iter().find(|rule| rule.id == prefix) {
        return Ok(rule.id.clone());
    }

    let matches: Vec<&Rule> = rules
        .iter()
        .filter(|rule| !prefix.is_empty() && rule.id.starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [rule] => Ok(rule.id.clone()),
        [] => anyhow::bail!("rule not found: {}", prefix),
        _ => anyhow::bail!(
            "'{}' matches {} rules, use a longer id",
            prefix,
            matches.len()
        ),
    }
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LENGTH) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn warn_invalid(error: &RuleError) {
    eprintln!("warning: this rule does not validate ({})", error);
}
