pub fn percent_label(value: f64) -> String {
    format!("{value:.0}%")
}

pub fn kelvin_label(kelvin: u32) -> String {
    format!("{kelvin} K")
}
