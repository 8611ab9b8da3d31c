//! Projectable place attributes and field projection.
//!
//! The catalog is a closed enumeration: every attribute a caller may request
//! is a `PlaceField` variant carrying its caller-facing identifier (also the
//! CSV header label) and the dotted path into the raw place JSON returned by
//! the Places API. Unknown identifiers never reach the rest of the pipeline;
//! `Projection::normalize` is the single validation boundary.

use serde_json::Value;

/// Separator used when a multi-valued attribute is rendered as one cell.
const LIST_SEPARATOR: &str = ", ";

/// Defines the field catalog in one place: variant, caller identifier, and
/// the dotted path into the raw place JSON (also the detail field mask entry).
macro_rules! place_fields {
    ($( $variant:ident => ($ident:literal, $path:literal) ),+ $(,)?) => {
        /// A projectable attribute of a place record.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PlaceField {
            $($variant),+
        }

        impl PlaceField {
            /// Every catalog entry, in canonical catalog order.
            pub const ALL: &'static [PlaceField] = &[$(PlaceField::$variant),+];

            /// The caller-facing identifier, also used as the CSV header label.
            pub fn ident(self) -> &'static str {
                match self {
                    $(PlaceField::$variant => $ident),+
                }
            }

            /// The dotted path into the raw place JSON for this attribute.
            pub fn json_path(self) -> &'static str {
                match self {
                    $(PlaceField::$variant => $path),+
                }
            }

            /// Looks an identifier up in the catalog. Unknown identifiers
            /// yield `None`; they are never an error.
            pub fn from_ident(ident: &str) -> Option<PlaceField> {
                match ident {
                    $($ident => Some(PlaceField::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

place_fields! {
    // ── Identity ──────────────────────────────────────────────────────────────
    Id => ("id", "id"),
    DisplayName => ("displayName", "displayName.text"),
    FormattedAddress => ("formattedAddress", "formattedAddress"),
    ShortFormattedAddress => ("shortFormattedAddress", "shortFormattedAddress"),
    Types => ("types", "types"),
    PrimaryType => ("primaryType", "primaryType"),
    PrimaryTypeDisplayName => ("primaryTypeDisplayName", "primaryTypeDisplayName.text"),
    BusinessStatus => ("businessStatus", "businessStatus"),
    GoogleMapsUri => ("googleMapsUri", "googleMapsUri"),
    PlusCode => ("plusCode", "plusCode.globalCode"),
    Latitude => ("location.latitude", "location.latitude"),
    Longitude => ("location.longitude", "location.longitude"),
    EditorialSummary => ("editorialSummary", "editorialSummary.text"),
    UtcOffsetMinutes => ("utcOffsetMinutes", "utcOffsetMinutes"),
    // ── Contact ───────────────────────────────────────────────────────────────
    NationalPhoneNumber => ("nationalPhoneNumber", "nationalPhoneNumber"),
    InternationalPhoneNumber => ("internationalPhoneNumber", "internationalPhoneNumber"),
    WebsiteUri => ("websiteUri", "websiteUri"),
    // ── Ratings & pricing ─────────────────────────────────────────────────────
    Rating => ("rating", "rating"),
    UserRatingCount => ("userRatingCount", "userRatingCount"),
    PriceLevel => ("priceLevel", "priceLevel"),
    // ── Hours ─────────────────────────────────────────────────────────────────
    WeekdayDescriptions => ("openingHours.weekdayDescriptions", "regularOpeningHours.weekdayDescriptions"),
    OpenNow => ("openingHours.openNow", "regularOpeningHours.openNow"),
    // ── Accessibility ─────────────────────────────────────────────────────────
    WheelchairAccessibleParking => ("accessibilityOptions.wheelchairAccessibleParking", "accessibilityOptions.wheelchairAccessibleParking"),
    WheelchairAccessibleEntrance => ("accessibilityOptions.wheelchairAccessibleEntrance", "accessibilityOptions.wheelchairAccessibleEntrance"),
    WheelchairAccessibleRestroom => ("accessibilityOptions.wheelchairAccessibleRestroom", "accessibilityOptions.wheelchairAccessibleRestroom"),
    WheelchairAccessibleSeating => ("accessibilityOptions.wheelchairAccessibleSeating", "accessibilityOptions.wheelchairAccessibleSeating"),
    // ── Payment ───────────────────────────────────────────────────────────────
    AcceptsCreditCards => ("paymentOptions.acceptsCreditCards", "paymentOptions.acceptsCreditCards"),
    AcceptsDebitCards => ("paymentOptions.acceptsDebitCards", "paymentOptions.acceptsDebitCards"),
    AcceptsCashOnly => ("paymentOptions.acceptsCashOnly", "paymentOptions.acceptsCashOnly"),
    AcceptsNfc => ("paymentOptions.acceptsNfc", "paymentOptions.acceptsNfc"),
    // ── Parking ───────────────────────────────────────────────────────────────
    FreeParkingLot => ("parkingOptions.freeParkingLot", "parkingOptions.freeParkingLot"),
    PaidParkingLot => ("parkingOptions.paidParkingLot", "parkingOptions.paidParkingLot"),
    FreeStreetParking => ("parkingOptions.freeStreetParking", "parkingOptions.freeStreetParking"),
    ValetParking => ("parkingOptions.valetParking", "parkingOptions.valetParking"),
    // ── Amenities ─────────────────────────────────────────────────────────────
    Takeout => ("takeout", "takeout"),
    Delivery => ("delivery", "delivery"),
    DineIn => ("dineIn", "dineIn"),
    CurbsidePickup => ("curbsidePickup", "curbsidePickup"),
    Reservable => ("reservable", "reservable"),
    ServesBreakfast => ("servesBreakfast", "servesBreakfast"),
    ServesBrunch => ("servesBrunch", "servesBrunch"),
    ServesLunch => ("servesLunch", "servesLunch"),
    ServesDinner => ("servesDinner", "servesDinner"),
    ServesBeer => ("servesBeer", "servesBeer"),
    ServesWine => ("servesWine", "servesWine"),
    ServesCocktails => ("servesCocktails", "servesCocktails"),
    ServesCoffee => ("servesCoffee", "servesCoffee"),
    ServesDessert => ("servesDessert", "servesDessert"),
    ServesVegetarianFood => ("servesVegetarianFood", "servesVegetarianFood"),
    OutdoorSeating => ("outdoorSeating", "outdoorSeating"),
    LiveMusic => ("liveMusic", "liveMusic"),
    MenuForChildren => ("menuForChildren", "menuForChildren"),
    GoodForChildren => ("goodForChildren", "goodForChildren"),
    GoodForGroups => ("goodForGroups", "goodForGroups"),
    GoodForWatchingSports => ("goodForWatchingSports", "goodForWatchingSports"),
    AllowsDogs => ("allowsDogs", "allowsDogs"),
    Restroom => ("restroom", "restroom"),
}

impl PlaceField {
    /// Resolves this field's value from a raw place JSON object.
    ///
    /// Walks the dotted path one segment at a time. A missing key or a
    /// non-object intermediate resolves to the empty string; resolution
    /// never fails.
    pub fn resolve(self, place: &Value) -> String {
        let mut current = place;
        for segment in self.json_path().split('.') {
            match current.get(segment) {
                Some(next) => current = next,
                None => return String::new(),
            }
        }
        render_value(current)
    }
}

/// Renders a resolved JSON value as a single display string.
///
/// Scalars render without JSON quoting; arrays join their rendered elements
/// with `", "`; null and unprojected nested objects render empty.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Value::Object(_) => String::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Projection
// ─────────────────────────────────────────────────────────────────────────────

/// A validated, ordered, duplicate-free set of fields to project.
///
/// Invariant: never empty and every element is in the catalog. The order of
/// the fields determines the column order of the exported table.
///
/// Ordering policy: the caller's requested order is preserved; the canonical
/// catalog order is substituted only when the request is empty or entirely
/// invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<PlaceField>,
}

impl Projection {
    /// Normalizes a caller-supplied field list into a valid projection.
    ///
    /// Unknown identifiers are silently dropped and duplicates removed
    /// (first occurrence wins). An empty result falls back to the full
    /// catalog.
    pub fn normalize(requested: &[String]) -> Self {
        let mut fields: Vec<PlaceField> = Vec::new();
        for ident in requested {
            if let Some(field) = PlaceField::from_ident(ident.trim()) {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        if fields.is_empty() {
            fields = PlaceField::ALL.to_vec();
        }
        Self { fields }
    }

    /// The full catalog in canonical order.
    pub fn default_catalog() -> Self {
        Self {
            fields: PlaceField::ALL.to_vec(),
        }
    }

    pub fn fields(&self) -> &[PlaceField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Header labels in projection order.
    pub fn headers(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.ident()).collect()
    }

    /// The `X-Goog-FieldMask` value for a detail fetch of this projection.
    pub fn detail_field_mask(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.json_path())
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PlaceRecord
// ─────────────────────────────────────────────────────────────────────────────

/// One place, projected: a cell per projection field, in projection order.
///
/// Absent values are empty strings, never omitted, so the row width always
/// equals the projection length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceRecord {
    cells: Vec<String>,
}

impl PlaceRecord {
    /// Projects a raw place JSON object into a record.
    pub fn project(place: &Value, projection: &Projection) -> Self {
        let cells = projection
            .fields()
            .iter()
            .map(|field| field.resolve(place))
            .collect();
        Self { cells }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
