use detour_core::{ConfigStore, MINUTES_SAVED_PER_REDIRECT};

pub fn execute(store: &ConfigStore) {
    println!("{}", render(store));
}

pub fn render(store: &ConfigStore) -> String {
    let total = store.savings();
    let money = match store.settings().hourly_rate {
        Some(rate) => format!("{} (at {:.2}/h)", total.money_label(), rate),
        None => format!("{} (no hourly rate set)", total.money_label()),
    };

    let mut lines = vec![
        String::new(),
        format!("Redirects:   {}", total.redirects),
        format!("Time saved:  {}", total.duration_label()),
        format!("Money saved: {}", money),
        format!(
            "Estimate:    {} minutes per redirect",
            MINUTES_SAVED_PER_REDIRECT
        ),
    ];

    let mut rows: Vec<_> = store
        .rules()
        .iter()
        .map(|rule| (rule, store.rule_savings(&rule.id)))
        .filter(|(_, savings)| savings.redirects > 0)
        .collect();
    rows.sort_by(|a, b| b.1.redirects.cmp(&a.1.redirects));

    if !rows.is_empty() {
        lines.push(String::new());
        lines.push("By rule:".to_string());
    }

    for (index, (rule, savings)) in rows.iter().enumerate() {
        let prefix = if index == rows.len() - 1 {
            "└──"
        } else {
            "├──"
        };
        lines.push(format!(
            "{} {:28} {:>6} {:>9} {:>9}",
            prefix,
            rule.source_hostname,
            savings.redirects,
            savings.duration_label(),
            savings.money_label()
        ));
    }

    lines.join("\n")
}
