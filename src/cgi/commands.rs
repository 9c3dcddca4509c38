//! Thin wrappers for individual camera features.
//!
//! Each one only names a command and packages its parameters; the behaviour
//! lives in [`CameraClient::execute_command`].

use super::client::{CameraClient, Callback, Execution};
use super::map::Params;
use super::request::CommandRequest;
use super::transport::Transport;

/// Pan/tilt directions understood by the `ptzMove*` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtzDirection {
    Up,
    Down,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl PtzDirection {
    pub fn command(self) -> &'static str {
        match self {
            Self::Up => "ptzMoveUp",
            Self::Down => "ptzMoveDown",
            Self::Left => "ptzMoveLeft",
            Self::Right => "ptzMoveRight",
            Self::TopLeft => "ptzMoveTopLeft",
            Self::TopRight => "ptzMoveTopRight",
            Self::BottomLeft => "ptzMoveBottomLeft",
            Self::BottomRight => "ptzMoveBottomRight",
        }
    }
}

impl<T: Transport + 'static> CameraClient<T> {
    /// Alarm, record and SD card state.
    pub async fn get_dev_state(&self, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::new("getDevState"), callback).await
    }

    /// Model, firmware and hardware versions.
    pub async fn get_dev_info(&self, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::new("getDevInfo"), callback).await
    }

    /// DHCP flag, address, gateway, mask and DNS servers.
    pub async fn get_ip_info(&self, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::new("getIPInfo"), callback).await
    }

    pub async fn get_pppoe_config(&self, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::new("getPPPoEConfig"), callback).await
    }

    pub async fn get_motion_detect_config(&self, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::new("getMotionDetectConfig"), callback).await
    }

    pub async fn set_motion_detect_config(&self, params: Params, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::with_params("setMotionDetectConfig", params), callback)
            .await
    }

    /// Take a snapshot. The result carries the JPEG bytes untouched.
    pub async fn snap_picture_2(&self, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::new("snapPicture2").raw(), callback).await
    }

    /// Read `count` log records starting at `offset`.
    pub async fn get_log(&self, offset: u32, count: u32, callback: Option<Callback>) -> Execution {
        let params = Params::new().with("offset", offset).with("count", count);
        self.execute_command(CommandRequest::with_params("getLog", params), callback).await
    }

    pub async fn ptz_move(&self, direction: PtzDirection, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::new(direction.command()), callback).await
    }

    pub async fn ptz_stop_run(&self, callback: Option<Callback>) -> Execution {
        self.execute_command(CommandRequest::new("ptzStopRun"), callback).await
    }

    pub async fn ptz_goto_preset(&self, name: &str, callback: Option<Callback>) -> Execution {
        let params = Params::new().with("name", name);
        self.execute_command(CommandRequest::with_params("ptzGotoPresetPoint", params), callback)
            .await
    }
}
