//! Bindings for the tables created by `migrations/V1__create_schema.sql`.

pgdsl::table! {
    /// A conference attendee.
    pub struct Person => "public"."person" {
        #[primary_key]
        id: i64 = "id",
        first_name: String = "first_name",
        last_name: String = "last_name" [nullable],
    }
}

pgdsl::table! {
    pub struct Event => "public"."event" {
        #[primary_key]
        id: i64 = "id",
        name: String = "name",
    }
}

pgdsl::table! {
    pub struct Location => "public"."location" {
        #[primary_key]
        id: i64 = "id",
        name: String = "name",
    }
}

pgdsl::table! {
    /// Which person attended which event, and where.
    pub struct PersonEventLog => "public"."person_event_log" {
        #[primary_key]
        id: i64 = "id",
        person_id: i64 = "person_id",
        location_id: i64 = "location_id" [nullable],
        event_id: i64 = "event_id",
    }
}

pub const PERSON: Person = Person::new();
pub const EVENT: Event = Event::new();
pub const LOCATION: Location = Location::new();
pub const PERSON_EVENT_LOG: PersonEventLog = PersonEventLog::new();
