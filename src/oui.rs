use libwifi::frame::components::MacAddress;

/// Returned when no prefix matches.
pub const UNKNOWN_VENDOR: &str = "Unknown";

const OUI_24_BIT_MASK: u64 = 0x0000FFFFFF000000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OuiRecord {
    oui: u64,
    short_name: &'static str,
}

impl OuiRecord {
    const fn new(prefix: [u8; 3], short_name: &'static str) -> OuiRecord {
        OuiRecord {
            oui: (prefix[0] as u64) << 40 | (prefix[1] as u64) << 32 | (prefix[2] as u64) << 24,
            short_name,
        }
    }

    pub fn short_name(&self) -> &'static str {
        self.short_name
    }

    pub fn oui(&self) -> String {
        format!("{:06X}/24", self.oui >> 24)
    }

    fn matches(&self, mac_address: &MacAddress) -> bool {
        mac_address.to_u64() & OUI_24_BIT_MASK == self.oui
    }
}

static RECORDS: [OuiRecord; 8] = [
    OuiRecord::new([0xB8, 0x27, 0xEB], "RaspberryPi"),
    OuiRecord::new([0xDC, 0xA6, 0x32], "RaspberryPi"),
    OuiRecord::new([0xAC, 0xDE, 0x48], "Apple"),
    OuiRecord::new([0xF0, 0x18, 0x98], "Apple"),
    OuiRecord::new([0x28, 0x11, 0xA5], "Samsung"),
    OuiRecord::new([0x34, 0x2E, 0xB7], "Samsung"),
    OuiRecord::new([0x00, 0x50, 0x56], "VMware"),
    OuiRecord::new([0x08, 0x00, 0x27], "VirtualBox"),
];

pub fn search(mac_address: &MacAddress) -> Option<&'static OuiRecord> {
    RECORDS.iter().find(|record| record.matches(mac_address))
}

/// Vendor name for a MAC, `"Unknown"` when the prefix isn't in the table.
pub fn vendor_of(mac_address: &MacAddress) -> &'static str {
    search(mac_address).map_or(UNKNOWN_VENDOR, OuiRecord::short_name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_known_prefixes() {
        let pi = MacAddress([0xDC, 0xA6, 0x32, 0x01, 0x02, 0x03]);
        assert_eq!(vendor_of(&pi), "RaspberryPi");

        let apple = MacAddress([0xF0, 0x18, 0x98, 0xFF, 0xFF, 0xFE]);
        assert_eq!(vendor_of(&apple), "Apple");

        let vbox = MacAddress([0x08, 0x00, 0x27, 0x00, 0x00, 0x01]);
        assert_eq!(vendor_of(&vbox), "VirtualBox");
        assert_eq!(search(&vbox).map(OuiRecord::oui), Some("080027/24".to_string()));
    }

    #[test]
    fn test_unknown_prefix() {
        let mac = MacAddress([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert_eq!(vendor_of(&mac), UNKNOWN_VENDOR);

        // Only the first three bytes count.
        let near_miss = MacAddress([0xB8, 0x27, 0xEC, 0xB8, 0x27, 0xEB]);
        assert_eq!(vendor_of(&near_miss), UNKNOWN_VENDOR);
    }
}
