// 热门短视频后端库
//
// 本库提供短视频列表的获取与缓存功能，包括：
// - API 路由
// - 配置加载
// - YouTube Data API 请求构建与响应分类
// - 短视频分类、回退查询与结果排序
// - 带 TTL 的本地缓存与配额记账

pub mod api;
pub mod config;
pub mod external;
pub mod models;
pub mod services;
