//! Client connection layer

pub mod cluster;
pub mod connector;
pub mod control_plane;
pub mod raw_connection;
pub mod standalone;

pub use cluster::ClusterClient;
pub use connector::{connect, Connector, Dialer, Established, TcpDialer};
pub use control_plane::{ControlPlane, ControlPlaneExt, Deployment};
pub use raw_connection::RawConnection;
pub use standalone::StandaloneClient;
