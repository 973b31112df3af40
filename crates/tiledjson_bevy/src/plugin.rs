use bevy::prelude::*;

use crate::asset::TiledJsonMap;
use crate::loader::TiledJsonMapLoader;

/// Plugin that registers the Tiled JSON map asset and its loader
///
/// # Example
/// ```no_run
/// use bevy::prelude::*;
/// use tiledjson_bevy::prelude::*;
///
/// fn load(asset_server: Res<AssetServer>) {
///     let _map: Handle<TiledJsonMap> = asset_server.load("maps/level1.tmj");
/// }
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(TiledJsonPlugin)
///     .add_systems(Startup, load)
///     .run();
/// ```
///
/// Loader settings are a [`DecodeConfig`](tiledjson_assets::DecodeConfig),
/// so strictness can be chosen per map with `load_with_settings`.
pub struct TiledJsonPlugin;

impl Plugin for TiledJsonPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<TiledJsonMap>()
            .register_asset_loader(TiledJsonMapLoader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_the_map_asset() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .add_plugins(TiledJsonPlugin);
        assert!(app.world().contains_resource::<Assets<TiledJsonMap>>());
    }
}
