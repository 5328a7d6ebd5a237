use std::fmt;

/// This is our representation of a MAC-address
///
/// ```
/// use libwifi::frame::components::MacAddress;
///
/// let address = MacAddress([255, 255, 255, 255, 255, 255]);
/// println!("{}", address.is_broadcast());
/// // -> true
/// ```
///
/// Ordering is lexicographic over the six bytes, which is what registries rely on for
/// deterministic traversal.
#[derive(Clone, Debug, Eq, PartialEq, Copy, Ord, PartialOrd, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn from_slice(slice: &[u8]) -> Option<MacAddress> {
        let bytes: [u8; 6] = slice.get(0..6)?.try_into().ok()?;
        Some(MacAddress(bytes))
    }

    /// Generate u64.
    pub fn to_u64(&self) -> u64 {
        let bytes = self.0;
        (bytes[0] as u64) << 40
            | (bytes[1] as u64) << 32
            | (bytes[2] as u64) << 24
            | (bytes[3] as u64) << 16
            | (bytes[4] as u64) << 8
            | (bytes[5] as u64)
    }

    /// The organizationally unique identifier, the first three bytes.
    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn broadcast() -> Self {
        MacAddress([255, 255, 255, 255, 255, 255])
    }

    pub fn zeroed() -> Self {
        MacAddress([0, 0, 0, 0, 0, 0])
    }

    /// Check if this is a multicast address
    pub fn is_mcast(&self) -> bool {
        self.0[0] % 2 == 1
    }

    /// Check whether this MAC addresses the whole network.
    pub fn is_broadcast(&self) -> bool {
        self.0 == [255, 255, 255, 255, 255, 255]
    }

    /// The 01:00:5e::0/18 space is reserved for ipv4 multicast
    pub fn is_ipv4_multicast(&self) -> bool {
        self.0[0] == 1 && self.0[1] == 0 && self.0[2] == 94
    }

    /// The 33:33::0/24 space is reserved for ipv6 multicast
    pub fn is_ipv6_multicast(&self) -> bool {
        self.0[0] == 51 && self.0[1] == 51
    }

    /// Whether the address belongs to an actual radio rather than a group or meta address.
    pub fn is_real_device(&self) -> bool {
        !(self.is_ipv6_multicast()
            || self.is_broadcast()
            || self.is_ipv4_multicast()
            || self.is_mcast()
            || *self == MacAddress::zeroed())
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MacParseError {
    InvalidDigit,
    InvalidLength,
}

impl fmt::Display for MacParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacParseError::InvalidDigit => write!(f, "Invalid hex digit in mac address"),
            MacParseError::InvalidLength => write!(f, "Mac address must have six octets"),
        }
    }
}

impl std::error::Error for MacParseError {}

impl std::str::FromStr for MacAddress {
    type Err = MacParseError;

    /// Accepts `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` and `aabbccddeeff`, any case.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim().to_lowercase();
        let octets: Vec<&str> = if input.contains(':') {
            input.split(':').collect()
        } else if input.contains('-') {
            input.split('-').collect()
        } else if input.len() == 12 && input.is_ascii() {
            (0..6).map(|i| &input[i * 2..i * 2 + 2]).collect()
        } else {
            return Err(MacParseError::InvalidLength);
        };

        if octets.len() != 6 {
            return Err(MacParseError::InvalidLength);
        }

        let mut array = [0u8; 6];
        for (slot, octet) in array.iter_mut().zip(octets) {
            if octet.len() != 2 {
                return Err(MacParseError::InvalidDigit);
            }
            *slot = u8::from_str_radix(octet, 16).map_err(|_| MacParseError::InvalidDigit)?;
        }

        Ok(MacAddress(array))
    }
}
