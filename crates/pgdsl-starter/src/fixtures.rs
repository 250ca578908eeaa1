//! Seed helpers shared by the demo binary and the database tests.

use crate::schema::{
    EVENT, Event, LOCATION, Location, PERSON, PERSON_EVENT_LOG, Person, PersonEventLog,
};
use pgdsl::record::store;
use pgdsl::{GenericClient, Mutation, OrmResult, TableRecord, delete_from};

/// Delete every row of the starter schema, children first.
pub async fn clean_up(conn: &impl GenericClient) -> OrmResult<()> {
    delete_from(&PERSON_EVENT_LOG).execute(conn).await?;
    delete_from(&PERSON).execute(conn).await?;
    delete_from(&LOCATION).execute(conn).await?;
    delete_from(&EVENT).execute(conn).await?;
    Ok(())
}

pub async fn new_person(
    conn: &impl GenericClient,
    first_name: &str,
    last_name: Option<&str>,
) -> OrmResult<TableRecord<Person>> {
    let mut person = TableRecord::new(&PERSON);
    person.set(&PERSON.first_name, first_name)?;
    match last_name {
        Some(last_name) => person.set(&PERSON.last_name, last_name)?,
        None => person.set_null(&PERSON.last_name)?,
    }
    store(&mut person, conn).await?;
    Ok(person)
}

pub async fn new_event(conn: &impl GenericClient, name: &str) -> OrmResult<TableRecord<Event>> {
    let mut event = TableRecord::new(&EVENT);
    event.set(&EVENT.name, name)?;
    store(&mut event, conn).await?;
    Ok(event)
}

pub async fn new_location(
    conn: &impl GenericClient,
    name: &str,
) -> OrmResult<TableRecord<Location>> {
    let mut location = TableRecord::new(&LOCATION);
    location.set(&LOCATION.name, name)?;
    store(&mut location, conn).await?;
    Ok(location)
}

/// Log that `person` attended `event`, optionally at `location`.
pub async fn new_person_event_log(
    conn: &impl GenericClient,
    person: &TableRecord<Person>,
    event: &TableRecord<Event>,
    location: Option<&TableRecord<Location>>,
) -> OrmResult<TableRecord<PersonEventLog>> {
    let mut log = TableRecord::new(&PERSON_EVENT_LOG);
    log.set(&PERSON_EVENT_LOG.person_id, person.get(&PERSON.id)?)?;
    log.set(&PERSON_EVENT_LOG.event_id, event.get(&EVENT.id)?)?;
    if let Some(location) = location {
        log.set(&PERSON_EVENT_LOG.location_id, location.get(&LOCATION.id)?)?;
    }
    store(&mut log, conn).await?;
    Ok(log)
}
