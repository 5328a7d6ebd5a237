use crate::frame::components::MacAddress;
use crate::frame::FrameRecord;

/// Helper trait to easily access source, destination and bssid on frames.
pub trait Addresses {
    /// Returns the sender of the Frame.
    /// Control frames don't carry one.
    fn src(&self) -> Option<&MacAddress>;

    /// Returns the destination of the Frame.
    fn dest(&self) -> Option<&MacAddress>;

    /// This isn't always send in every frame (e.g. RTS).
    fn bssid(&self) -> Option<&MacAddress>;
}

impl Addresses for FrameRecord<'_> {
    fn src(&self) -> Option<&MacAddress> {
        self.source.as_ref()
    }

    fn dest(&self) -> Option<&MacAddress> {
        self.destination.as_ref()
    }

    fn bssid(&self) -> Option<&MacAddress> {
        self.bssid.as_ref()
    }
}
