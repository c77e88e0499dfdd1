// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use tracing::{debug, warn};

/// Number of logical mixing channels.
pub const MAX_CHANNELS: usize = 16;

/// A logical group of voices sharing a volume and a panning switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    /// 0 - 255
    volume: u8,
    panning: bool,
}

impl Channel {
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Whether positional voices on this channel are balanced left/right.
    pub fn panning(&self) -> bool {
        self.panning
    }
}

impl Default for Channel {
    fn default() -> Self {
        Channel {
            volume: u8::MAX,
            panning: false,
        }
    }
}

/// The table of logical channels.
#[derive(Debug, Clone)]
pub struct ChannelTable {
    channels: [Channel; MAX_CHANNELS],
}

impl ChannelTable {
    pub fn new() -> Self {
        Self {
            channels: [Channel::default(); MAX_CHANNELS],
        }
    }

    /// Sets a channel's volume (clamped to [0.0, 1.0]) and panning. Panning is enabled for
    /// any positive `pan`. Out of range ids are ignored.
    pub fn set(&mut self, id: usize, volume: f32, pan: f32) -> bool {
        let Some(channel) = self.channels.get_mut(id) else {
            warn!(channel = id, "Ignoring settings for unknown channel");
            return false;
        };

        channel.volume = (volume.clamp(0.0, 1.0) * 255.0) as u8;
        channel.panning = pan > 0.0;
        debug!(
            channel = id,
            volume = channel.volume,
            panning = channel.panning,
            "Configured channel"
        );
        true
    }

    /// Turns panning on or off, keeping the channel's volume.
    pub fn set_panning(&mut self, id: usize, panning: bool) -> bool {
        let Some(channel) = self.channels.get_mut(id) else {
            warn!(channel = id, "Ignoring panning for unknown channel");
            return false;
        };

        channel.panning = panning;
        debug!(channel = id, panning, "Configured channel panning");
        true
    }

    pub fn get(&self, id: usize) -> Option<&Channel> {
        self.channels.get(id)
    }

    pub fn contains(&self, id: usize) -> bool {
        id < MAX_CHANNELS
    }
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self::new()
    }
}
