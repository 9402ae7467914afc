use async_trait::async_trait;
use bb8::ManageConnection;
use lapin::{Channel, ChannelState, Connection, ConnectionProperties};

/// Opens connections to one broker. The event bus pools them, the fact source holds one per
/// subscription.
#[derive(Clone)]
pub struct RabbitConnector {
    url: String,
    properties: ConnectionProperties,
}

impl RabbitConnector {
    pub fn new(url: impl Into<String>, properties: ConnectionProperties) -> Self {
        Self {
            url: url.into(),
            properties,
        }
    }

    pub async fn open(&self) -> Result<Connection, lapin::Error> {
        Connection::connect(&self.url, self.properties.clone()).await
    }
}

#[async_trait]
impl ManageConnection for RabbitConnector {
    type Connection = Connection;
    type Error = lapin::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        self.open().await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        if self.has_broken(conn) {
            return Err(lapin::Error::InvalidConnectionState(conn.status().state()));
        }
        Ok(())
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        !conn.status().connected()
    }
}

/// Hands out publishing channels opened on pooled connections.
pub struct RabbitChannelManager {
    connections: bb8::Pool<RabbitConnector>,
}

impl RabbitChannelManager {
    pub fn new(connections: bb8::Pool<RabbitConnector>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl ManageConnection for RabbitChannelManager {
    type Connection = Channel;
    type Error = lapin::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let connection = self.connections.get().await.map_err(|error| match error {
            bb8::RunError::User(error) => error,
            bb8::RunError::TimedOut => lapin::Error::InvalidChannelState(ChannelState::Closed),
        })?;
        connection.create_channel().await
    }

    async fn is_valid(&self, channel: &mut Self::Connection) -> Result<(), Self::Error> {
        if self.has_broken(channel) {
            return Err(lapin::Error::InvalidChannelState(channel.status().state()));
        }
        Ok(())
    }

    fn has_broken(&self, channel: &mut Self::Connection) -> bool {
        !channel.status().connected()
    }
}
