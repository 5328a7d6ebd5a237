use strum_macros::Display;

/// Coarse security classification of a network, as advertised in its beacons.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum Security {
    #[default]
    Open,
    #[strum(serialize = "WEP")]
    Wep,
    #[strum(serialize = "WPA")]
    Wpa,
    #[strum(serialize = "WPA2")]
    Wpa2,
}
