use anyhow::Result;
use detour_core::ConfigStore;

pub async fn execute(store: &mut ConfigStore, value: Option<&str>, clear: bool) -> Result<()> {
    let input = match (value, clear) {
        (_, true) => "",
        (Some(value), false) => value,
        (None, false) => {
            display_rate(store.settings().hourly_rate);
            return Ok(());
        }
    };

    let hourly_rate = store.set_hourly_rate(input).await?;

    match hourly_rate {
        Some(rate) => println!("Hourly rate set to {:.2}.", rate),
        None => println!("Hourly rate cleared."),
    }
    Ok(())
}

fn display_rate(hourly_rate: Option<f64>) {
    match hourly_rate {
        Some(rate) => println!("Hourly rate: {:.2}", rate),
        None => println!("No hourly rate set. Money saved is shown as $0.00."),
    }
}
